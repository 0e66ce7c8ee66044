//! Parser Module
//!
//! quick-xmlとzipを使用したXLSXパッケージ解析の実装。
//! 最初のワークシートだけを対象とし、数式・書式・結合セルは扱いません。

mod cell;
mod package;
mod shared_strings;
mod sheet;
mod workbook;
mod xlsx;
mod xml;

pub(crate) use xlsx::read_xlsx_records;
