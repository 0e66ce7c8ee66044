//! Package Reader Module
//!
//! XLSXパッケージ（ZIPアーカイブ）からパートを読み出すための抽象化。
//! 解析ロジックはこのトレイト越しにパートを取得するため、テストでは
//! メモリ上のフィクスチャに差し替えられます。

use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ImportError;
use crate::security::ImportLimits;

/// パッケージ内のパートを名前で読み出す
pub(crate) trait PackageReader {
    /// パートの内容を読み出す
    ///
    /// # 戻り値
    ///
    /// * `Ok(Some(bytes))` - パートが存在する場合
    /// * `Ok(None)` - パートが存在しない場合
    /// * `Err(ImportError)` - アーカイブの読み込みに失敗した場合
    fn read_part(&mut self, path: &str) -> Result<Option<Vec<u8>>, ImportError>;
}

/// メモリ上のバイト列をZIPアーカイブとして扱うパッケージ
pub(crate) struct ZipPackage<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    max_entry_size: u64,
}

impl<'a> ZipPackage<'a> {
    /// ZIPアーカイブを開き、セキュリティ制限を検証する
    pub fn open(bytes: &'a [u8], limits: &ImportLimits) -> Result<Self, ImportError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ImportError::CorruptArchive(e.to_string()))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| ImportError::CorruptArchive(e.to_string()))?;
            entries.push((file.name().to_string(), file.size()));
        }
        limits.check_entries(
            entries.len(),
            entries.iter().map(|(name, size)| (name.as_str(), *size)),
        )?;

        Ok(Self {
            archive,
            max_entry_size: limits.max_entry_size,
        })
    }
}

impl PackageReader for ZipPackage<'_> {
    fn read_part(&mut self, path: &str) -> Result<Option<Vec<u8>>, ImportError> {
        let file = match self.archive.by_name(path) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(ImportError::CorruptArchive(e.to_string())),
        };

        // 宣言サイズを偽装したエントリに備えて読み込み量を制限する
        let mut content = Vec::new();
        file.take(self.max_entry_size + 1)
            .read_to_end(&mut content)
            .map_err(|e| ImportError::CorruptArchive(format!("{}: {}", path, e)))?;
        if content.len() as u64 > self.max_entry_size {
            return Err(ImportError::SecurityViolation(format!(
                "File '{}' exceeds maximum size: {} bytes",
                path, self.max_entry_size
            )));
        }

        Ok(Some(content))
    }
}

/// テスト用のメモリ上パッケージ
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryPackage {
    parts: std::collections::HashMap<String, Vec<u8>>,
}

#[cfg(test)]
impl MemoryPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_part(mut self, path: &str, content: &str) -> Self {
        self.parts
            .insert(path.to_string(), content.as_bytes().to_vec());
        self
    }
}

#[cfg(test)]
impl PackageReader for MemoryPackage {
    fn read_part(&mut self, path: &str) -> Result<Option<Vec<u8>>, ImportError> {
        Ok(self.parts.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip_data = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
            let options = FileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        zip_data
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let result = ZipPackage::open(b"not a zip file", &ImportLimits::default());
        assert!(matches!(result, Err(ImportError::CorruptArchive(_))));
    }

    #[test]
    fn test_read_existing_and_missing_parts() {
        let data = build_zip(&[("xl/workbook.xml", b"<workbook/>")]);
        let mut package = ZipPackage::open(&data, &ImportLimits::default()).unwrap();

        assert_eq!(
            package.read_part("xl/workbook.xml").unwrap(),
            Some(b"<workbook/>".to_vec())
        );
        assert_eq!(package.read_part("xl/sharedStrings.xml").unwrap(), None);
    }

    #[test]
    fn test_open_rejects_traversal_entry() {
        let data = build_zip(&[("../evil.xml", b"x")]);
        let result = ZipPackage::open(&data, &ImportLimits::default());
        assert!(matches!(result, Err(ImportError::SecurityViolation(_))));
    }

    #[test]
    fn test_open_rejects_too_many_entries() {
        let data = build_zip(&[("a.xml", b"a"), ("b.xml", b"b"), ("c.xml", b"c")]);
        let limits = ImportLimits {
            max_entry_count: 2,
            ..ImportLimits::default()
        };
        let result = ZipPackage::open(&data, &limits);
        assert!(matches!(result, Err(ImportError::SecurityViolation(_))));
    }

    #[test]
    fn test_memory_package() {
        let mut package = MemoryPackage::new().with_part("xl/workbook.xml", "<workbook/>");
        assert!(package.read_part("xl/workbook.xml").unwrap().is_some());
        assert!(package.read_part("xl/styles.xml").unwrap().is_none());
    }
}
