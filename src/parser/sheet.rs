//! Sheet Projection Module
//!
//! ワークシートの行をヘッダー名付きのレコードに変換するモジュール。
//! 1行目をヘッダー行として扱い、2行目以降を`RawRecord`に射影します。

use std::collections::{BTreeMap, HashMap};

use crate::error::ImportError;
use crate::parser::cell::{column_index, decode_cell};
use crate::parser::xml::XmlElement;
use crate::types::{CellValue, RawRecord};

/// 1行分のセル（列インデックス -> 値、列順）
pub(crate) type RowCells = BTreeMap<usize, CellValue>;

/// 列インデックスからヘッダー名へのマッピング
///
/// 同じ基底名が複数回現れた場合、2回目以降は`"名前 (k)"`（kは1始まりの出現回数）
/// となります。ヘッダーのない列は、データ行で初めて参照された時点で
/// `"{label} {index+1}"`が割り当てられ、以降の行でも同じ名前が使われます。
#[derive(Debug, Clone)]
pub(crate) struct HeaderMap {
    names: BTreeMap<usize, String>,
    counts: HashMap<String, usize>,
    column_label: String,
}

impl HeaderMap {
    pub fn new(column_label: &str) -> Self {
        Self {
            names: BTreeMap::new(),
            counts: HashMap::new(),
            column_label: column_label.to_string(),
        }
    }

    /// ヘッダー行のセルから列名を登録する
    pub fn register(&mut self, column: usize, base: &str) {
        let name = self.allocate(base, column);
        self.names.insert(column, name);
    }

    /// 列名を取得する（未登録なら合成して記憶する）
    pub fn ensure(&mut self, column: usize) -> String {
        if let Some(name) = self.names.get(&column) {
            return name.clone();
        }
        let name = self.allocate("", column);
        self.names.insert(column, name.clone());
        name
    }

    #[cfg(test)]
    pub fn get(&self, column: usize) -> Option<&str> {
        self.names.get(&column).map(String::as_str)
    }

    fn allocate(&mut self, base: &str, column: usize) -> String {
        let trimmed = base.trim();
        let name_base = if trimmed.is_empty() {
            format!("{} {}", self.column_label, column + 1)
        } else {
            trimmed.to_string()
        };

        let count = self.counts.entry(name_base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            name_base
        } else {
            format!("{} ({})", name_base, count)
        }
    }
}

/// `<row>`要素のセルを列インデックス順に読み込む
///
/// 同じ列を指すセルが複数ある場合は後勝ちです。
pub(crate) fn read_row(row: &XmlElement, shared_strings: &[String]) -> RowCells {
    row.children_named("c")
        .map(|cell| {
            let column = column_index(cell.attr("r").unwrap_or_default());
            (column, decode_cell(cell, shared_strings))
        })
        .collect()
}

/// 行データをレコードに射影する
///
/// # 戻り値
///
/// * `Ok(Vec<RawRecord>)` - 1件以上のレコード
/// * `Err(ImportError::EmptyHeaderRow)` - ヘッダー行にセルがない場合
/// * `Err(ImportError::NoDataRows)` - ヘッダー行以降にレコードがない場合
pub(crate) fn project_rows(
    rows: Vec<RowCells>,
    column_label: &str,
) -> Result<Vec<RawRecord>, ImportError> {
    let mut rows = rows.into_iter();
    let header_row = rows.next().ok_or(ImportError::NoRows)?;
    if header_row.is_empty() {
        return Err(ImportError::EmptyHeaderRow);
    }

    let mut headers = HeaderMap::new(column_label);
    for (column, value) in &header_row {
        headers.register(*column, &value.to_header_text());
    }

    let mut records = Vec::new();
    for cells in rows {
        if cells.is_empty() {
            continue;
        }

        let mut record = RawRecord::new();
        for (column, value) in cells {
            // 空セルでも列名は確保しておく
            let header = headers.ensure(column);
            if value.is_blank() {
                continue;
            }
            record.insert(header, value.into_json());
        }

        if !record.is_empty() {
            records.push(record);
        }
    }

    if records.is_empty() {
        return Err(ImportError::NoDataRows);
    }
    Ok(records)
}
