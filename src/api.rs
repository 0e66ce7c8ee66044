//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::path::Path;

/// アップロードされたファイルの形式
///
/// ファイル名の拡張子（大文字小文字を区別しない）から判定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileFormat {
    /// `.json` - JSON配列としてのみ読み込む
    Json,

    /// `.xlsx` - XLSXワークブックとしてのみ読み込む
    Xlsx,

    /// 拡張子がない、または未知の拡張子
    ///
    /// JSON、XLSXの順に試行します。
    Unknown,
}

impl FileFormat {
    /// ファイル名から形式を判定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use deckimport::FileFormat;
    ///
    /// assert_eq!(FileFormat::from_filename("cards.JSON"), FileFormat::Json);
    /// assert_eq!(FileFormat::from_filename("deck.xlsx"), FileFormat::Xlsx);
    /// assert_eq!(FileFormat::from_filename("upload"), FileFormat::Unknown);
    /// ```
    pub fn from_filename(filename: &str) -> Self {
        match Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => FileFormat::Json,
            Some("xlsx") => FileFormat::Xlsx,
            _ => FileFormat::Unknown,
        }
    }
}
