//! Security Module
//!
//! セキュリティ対策を実装するモジュール。
//! ZIP bomb攻撃、パストラバーサル攻撃などへの対策を提供します。

use crate::error::ImportError;

/// アーカイブ読み込み時のセキュリティ制限
///
/// `ImporterBuilder`から設定され、ZIPアーカイブを開く時点で検証されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportLimits {
    /// ZIPアーカイブ内の最大エントリ数
    /// デフォルト: 10000
    pub max_entry_count: usize,
    /// 単一エントリの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_entry_size: u64,
    /// 展開後の合計最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_entry_count: 10_000,
            max_entry_size: 104_857_600,           // 100MB
            max_decompressed_size: 1_073_741_824, // 1GB
        }
    }
}

impl ImportLimits {
    /// 制限値の整合性を検証
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.max_entry_count == 0 {
            return Err(ImportError::Config(
                "max_entry_count must be greater than zero".to_string(),
            ));
        }
        if self.max_entry_size == 0 || self.max_decompressed_size == 0 {
            return Err(ImportError::Config(
                "size limits must be greater than zero".to_string(),
            ));
        }
        if self.max_entry_size > self.max_decompressed_size {
            return Err(ImportError::Config(format!(
                "max_entry_size ({}) exceeds max_decompressed_size ({})",
                self.max_entry_size, self.max_decompressed_size
            )));
        }
        Ok(())
    }

    /// アーカイブ全体のエントリ一覧を検証
    ///
    /// # 引数
    ///
    /// * `entries` - (エントリ名, 展開後サイズ) のイテレータ
    pub fn check_entries<'a, I>(&self, entry_count: usize, entries: I) -> Result<(), ImportError>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        if entry_count > self.max_entry_count {
            return Err(ImportError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                entry_count, self.max_entry_count
            )));
        }

        let mut total_decompressed_size = 0u64;
        for (name, size) in entries {
            validate_zip_path(name).map_err(|e| {
                ImportError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;

            if size > self.max_entry_size {
                return Err(ImportError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    name, size, self.max_entry_size
                )));
            }

            total_decompressed_size = total_decompressed_size.checked_add(size).ok_or_else(|| {
                ImportError::SecurityViolation(
                    "Total decompressed size calculation overflow".to_string(),
                )
            })?;

            if total_decompressed_size > self.max_decompressed_size {
                return Err(ImportError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total_decompressed_size, self.max_decompressed_size
                )));
            }
        }

        Ok(())
    }
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、ZIPエントリ名を検証します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // Windows形式の`C:\`やUnix形式の`/`で始まるパス
    let bytes = path.as_bytes();
    let has_drive_prefix = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if path.starts_with('/') || has_drive_prefix {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.split('/').any(|segment| segment == "..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
