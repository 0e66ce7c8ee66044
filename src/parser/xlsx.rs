//! Spreadsheet Import Module
//!
//! XLSXパッケージの最初のシートを読み込み、ヘッダー行をキーとした
//! レコード列に変換します。

use tracing::debug;

use crate::error::ImportError;
use crate::parser::package::{PackageReader, ZipPackage};
use crate::parser::shared_strings::load_shared_strings;
use crate::parser::sheet::{project_rows, read_row, RowCells};
use crate::parser::workbook::locate_primary_sheet;
use crate::parser::xml::XmlElement;
use crate::security::ImportLimits;
use crate::types::RawRecord;

/// バイト列をXLSXとして読み込み、レコード列を返す
///
/// # 引数
///
/// * `bytes` - XLSXファイルの内容
/// * `limits` - アーカイブのセキュリティ制限
/// * `column_label` - ヘッダーのない列に付ける名前の接頭語
pub(crate) fn read_xlsx_records(
    bytes: &[u8],
    limits: &ImportLimits,
    column_label: &str,
) -> Result<Vec<RawRecord>, ImportError> {
    let mut package = ZipPackage::open(bytes, limits)?;
    read_package_records(&mut package, column_label)
}

/// パッケージから最初のシートのレコード列を読み込む
pub(crate) fn read_package_records<P: PackageReader>(
    package: &mut P,
    column_label: &str,
) -> Result<Vec<RawRecord>, ImportError> {
    // 1. ワークブックとリレーションシップからシートの位置を解決
    let sheet_path = locate_primary_sheet(package)?;
    let sheet_xml = package
        .read_part(&sheet_path)?
        .ok_or_else(|| ImportError::MissingSheetData {
            path: sheet_path.clone(),
        })?;

    // 2. <sheetData>直下の<row>を収集
    let worksheet = XmlElement::parse(&sheet_path, &sheet_xml)?;
    let row_elements: Vec<&XmlElement> = worksheet
        .children_named("sheetData")
        .flat_map(|data| data.children_named("row"))
        .collect();
    if row_elements.is_empty() {
        return Err(ImportError::NoRows);
    }

    // 3. 共有文字列表（存在しない場合は空）
    let shared_strings = load_shared_strings(package)?;
    let rows: Vec<RowCells> = row_elements
        .into_iter()
        .map(|row| read_row(row, &shared_strings))
        .collect();

    debug!(
        sheet = %sheet_path,
        rows = rows.len(),
        shared_strings = shared_strings.len(),
        "read worksheet"
    );

    // 4. ヘッダー行を基準にレコードへ射影
    let records = project_rows(rows, column_label)?;
    debug!(records = records.len(), "projected worksheet rows");
    Ok(records)
}
