//! Card Assembly Module
//!
//! レコードに一意なIDとスコアを付与してカードを組み立てます。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ImportError;
use crate::types::RawRecord;

/// デッキに保存される1枚のカード
///
/// `score`はインポート時に0で初期化され、以降は採点処理でのみ更新されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// 一意なID（UUID v4）
    pub id: String,
    /// 正解数カウンタ
    pub score: i64,
    /// ヘッダー名（またはJSONキー）から値へのマッピング
    pub content: RawRecord,
}

impl Card {
    /// 新しいIDとスコア0でカードを作成
    pub fn new(content: RawRecord) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            score: 0,
            content,
        }
    }
}

/// レコード列をカード列に変換する（順序保持）
///
/// レコードが0件の場合は`ImportError::EmptyResult`を返します。
pub(crate) fn assemble_cards(records: Vec<RawRecord>) -> Result<Vec<Card>, ImportError> {
    if records.is_empty() {
        return Err(ImportError::EmptyResult);
    }
    Ok(records.into_iter().map(Card::new).collect())
}
