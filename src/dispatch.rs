//! Format Dispatch Module
//!
//! ファイル名の拡張子に応じてJSON/XLSXの読み込みを切り替えます。
//! 拡張子から判定できない場合はJSON、XLSXの順に試行し、両方失敗した場合は
//! 個別のエラーを破棄して`ImportError::UnsupportedFormat`を返します。

use tracing::debug;

use crate::api::FileFormat;
use crate::builder::ImportConfig;
use crate::error::ImportError;
use crate::json::read_json_records;
use crate::parser::read_xlsx_records;
use crate::types::RawRecord;

/// ファイル内容をレコード列として読み込む
pub(crate) fn read_records(
    bytes: &[u8],
    filename: &str,
    config: &ImportConfig,
) -> Result<Vec<RawRecord>, ImportError> {
    let format = FileFormat::from_filename(filename);
    debug!(filename, ?format, size = bytes.len(), "dispatching import");

    match format {
        FileFormat::Json => read_json_records(bytes),
        FileFormat::Xlsx => read_xlsx(bytes, config),
        FileFormat::Unknown => read_unknown(bytes, config),
    }
}

fn read_xlsx(bytes: &[u8], config: &ImportConfig) -> Result<Vec<RawRecord>, ImportError> {
    read_xlsx_records(bytes, &config.limits, &config.column_label)
}

fn read_unknown(bytes: &[u8], config: &ImportConfig) -> Result<Vec<RawRecord>, ImportError> {
    let json_error = match read_json_records(bytes) {
        Ok(records) => return Ok(records),
        Err(e) => e,
    };
    debug!(code = %json_error.code(), "not a JSON array, trying xlsx");

    read_xlsx(bytes, config).map_err(|xlsx_error| {
        debug!(
            json = %json_error.code(),
            xlsx = %xlsx_error.code(),
            "no importer accepted the file"
        );
        ImportError::UnsupportedFormat
    })
}
