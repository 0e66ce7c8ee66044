//! Builder Module
//!
//! Fluent Builder APIを提供し、`Importer`インスタンスを段階的に構築する。

use tracing::debug;

use crate::cards::{assemble_cards, Card};
use crate::dispatch::read_records;
use crate::error::ImportError;
use crate::multipart::Form;
use crate::security::ImportLimits;
use crate::upload::{DeckUpload, ImportedDeck};

/// インポート処理の設定を保持する内部構造体
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    /// アーカイブ読み込み時の制限
    pub limits: ImportLimits,

    /// 空のヘッダーセルに合成する列名の語（`"{label} {列番号}"`）
    pub column_label: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            limits: ImportLimits::default(),
            column_label: "Column".to_string(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Importer`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use deckimport::ImporterBuilder;
///
/// # fn main() -> Result<(), deckimport::ImportError> {
/// let importer = ImporterBuilder::new()
///     .with_column_label("Columna")
///     .with_max_entry_count(500)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ImporterBuilder {
    /// 内部設定（構築中）
    config: ImportConfig,
}

impl Default for ImporterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImporterBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 合成列名: `Column`
    /// - 最大エントリ数: 10000
    /// - 単一エントリの最大サイズ: 100MB
    /// - 展開後の合計最大サイズ: 1GB
    pub fn new() -> Self {
        Self {
            config: ImportConfig::default(),
        }
    }

    /// 空のヘッダーセルに使う列名の語を指定する
    ///
    /// # 引数
    ///
    /// * `label` - 列名の語。3列目が空の場合、`"{label} 3"`が合成されます
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use deckimport::ImporterBuilder;
    ///
    /// let builder = ImporterBuilder::new().with_column_label("Spalte");
    /// ```
    pub fn with_column_label(mut self, label: impl Into<String>) -> Self {
        self.config.column_label = label.into();
        self
    }

    /// ZIPアーカイブ内の最大エントリ数を指定する
    pub fn with_max_entry_count(mut self, count: usize) -> Self {
        self.config.limits.max_entry_count = count;
        self
    }

    /// 単一エントリの展開後の最大サイズ（バイト）を指定する
    pub fn with_max_entry_size(mut self, bytes: u64) -> Self {
        self.config.limits.max_entry_size = bytes;
        self
    }

    /// 展開後の合計最大サイズ（バイト）を指定する
    pub fn with_max_decompressed_size(mut self, bytes: u64) -> Self {
        self.config.limits.max_decompressed_size = bytes;
        self
    }

    /// 設定を検証し、`Importer`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Importer)`: 設定が有効な場合、Importerインスタンス
    /// * `Err(ImportError::Config)`: 設定が無効な場合
    ///
    /// # 発生し得るエラー
    ///
    /// * `ImportError::Config(String)`: 設定の検証に失敗した場合
    ///   * 列名の語が空、または空白のみ
    ///   * 制限値が0
    ///   * 単一エントリの最大サイズが合計最大サイズを超える
    pub fn build(self) -> Result<Importer, ImportError> {
        // 1. 列名の語の検証
        if self.config.column_label.trim().is_empty() {
            return Err(ImportError::Config(
                "column label must not be blank".to_string(),
            ));
        }

        // 2. 制限値の検証
        self.config.limits.validate()?;

        Ok(Importer::new(self.config))
    }
}

/// インポート処理のファサード
///
/// アップロードされたファイルをカード列に変換するためのメインエントリーポイントです。
/// 状態を持たないため、複数スレッドから同時に呼び出せます。
///
/// # 使用例
///
/// ```rust,no_run
/// use deckimport::ImporterBuilder;
///
/// # fn main() -> Result<(), deckimport::ImportError> {
/// let importer = ImporterBuilder::new().build()?;
/// let cards = importer.import_file("cards.json", br#"[{"q": "hola", "a": "hello"}]"#)?;
/// assert_eq!(cards.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Importer {
    /// インポート設定
    config: ImportConfig,
}

impl Importer {
    pub(crate) fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// ファイルの内容をカード列に変換
    ///
    /// # 引数
    ///
    /// * `filename` - アップロード時のファイル名（拡張子で形式を判定）
    /// * `bytes` - ファイルの内容
    ///
    /// # 戻り値
    ///
    /// * `Ok(Vec<Card>)` - 入力順のカード列（IDは新規発行、スコアは0）
    /// * `Err(ImportError)` - 形式の判定、読み込み、組み立てのいずれかで失敗した場合
    ///
    /// # 処理フロー
    ///
    /// 1. 拡張子による形式の判定
    /// 2. JSON/XLSXの読み込み（未知の拡張子は両方を試行）
    /// 3. カードの組み立て
    pub fn import_file(&self, filename: &str, bytes: &[u8]) -> Result<Vec<Card>, ImportError> {
        let records = read_records(bytes, filename, &self.config)?;
        let cards = assemble_cards(records)?;
        debug!(filename, cards = cards.len(), "imported cards");
        Ok(cards)
    }

    /// リクエストボディを`multipart/form-data`としてデコード
    ///
    /// # 引数
    ///
    /// * `body` - 生のリクエストボディ
    /// * `content_type` - `Content-Type`ヘッダーの値
    pub fn decode_form(&self, body: &[u8], content_type: &str) -> Result<Form, ImportError> {
        Form::parse(body, content_type)
    }

    /// アップロードフォームからデッキをインポート
    ///
    /// フォームの`name`フィールドをデッキ名、`file`フィールドをカードの入力として扱います。
    ///
    /// # 戻り値
    ///
    /// * `Ok(ImportedDeck)` - デッキ名とカード列
    /// * `Err(ImportError::MalformedForm)` - ボディをデコードできない場合
    /// * `Err(ImportError::MissingUploadFields)` - `name`または`file`が揃っていない場合
    /// * `Err(ImportError)` - ファイルの読み込みに失敗した場合
    ///
    /// # 使用例
    ///
    /// ```rust,no_run
    /// use deckimport::ImporterBuilder;
    ///
    /// # fn main() -> Result<(), deckimport::ImportError> {
    /// let importer = ImporterBuilder::new().build()?;
    /// let body: Vec<u8> = vec![]; // リクエストボディ
    /// let deck = importer.import_upload(&body, "multipart/form-data; boundary=xyz")?;
    /// println!("{}: {} cards", deck.name, deck.cards.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn import_upload(
        &self,
        body: &[u8],
        content_type: &str,
    ) -> Result<ImportedDeck, ImportError> {
        let form = self.decode_form(body, content_type)?;
        let upload = DeckUpload::from_form(&form)?;
        let cards = self.import_file(upload.filename(), upload.bytes())?;

        Ok(ImportedDeck {
            name: upload.name.to_string(),
            cards,
        })
    }
}
