//! Upload Module
//!
//! デコード済みフォームからデッキ名とファイルを取り出します。

use serde::Serialize;

use crate::cards::Card;
use crate::error::ImportError;
use crate::multipart::{FileField, Form};

/// フォームから取り出したデッキのアップロード内容
///
/// `name`はトリム済みで空ではなく、`file`はファイル名を持つファイルフィールドです。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckUpload<'a> {
    /// デッキ名（トリム済み）
    pub name: &'a str,
    /// カードを含むファイル
    pub file: &'a FileField,
}

impl<'a> DeckUpload<'a> {
    /// フォームの`name`と`file`フィールドからアップロード内容を取り出す
    ///
    /// # 戻り値
    ///
    /// * `Ok(DeckUpload)` - 両方のフィールドが揃っている場合
    /// * `Err(ImportError::MissingUploadFields)` - `name`が空白のみ、存在しない、
    ///   または`file`がファイルフィールドでない場合
    pub fn from_form(form: &'a Form) -> Result<Self, ImportError> {
        let name = form
            .get_first("name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ImportError::MissingUploadFields)?;
        let file = form
            .file("file")
            .filter(|file| !file.filename.is_empty())
            .ok_or(ImportError::MissingUploadFields)?;

        Ok(Self { name, file })
    }

    /// アップロードされたファイル名
    pub fn filename(&self) -> &'a str {
        &self.file.filename
    }

    /// アップロードされたファイルの内容
    pub fn bytes(&self) -> &'a [u8] {
        &self.file.bytes
    }
}

/// インポート済みのデッキ
///
/// 永続化とデッキIDの採番は呼び出し側の責務です。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedDeck {
    pub name: String,
    pub cards: Vec<Card>,
}
