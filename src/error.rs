//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーメッセージのフォーマットを実現する。
//!
//! すべての失敗は`ImportError`として呼び出し元へ返され、`ImportError::code()`で
//! 安定した機械判定用コードを取得できます。メッセージを解析する必要はありません。

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// インポート処理全体で使用するエラー型
///
/// multipartフォームの解析、形式の判定、JSON/XLSXの読み込み、カードの組み立て中に
/// 発生するすべてのエラーを統一的に扱います。
///
/// # 使用例
///
/// ```rust,no_run
/// use deckimport::{ErrorCode, ImporterBuilder};
///
/// # fn main() -> Result<(), deckimport::ImportError> {
/// let importer = ImporterBuilder::new().build()?;
/// match importer.import_file("cards.json", b"{}") {
///     Err(e) if e.code() == ErrorCode::NotAnArray => println!("{}", e),
///     _ => {}
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ImportError {
    /// リクエストボディがmultipart/form-dataとして解釈できない
    #[error("The submitted form could not be parsed: {0}")]
    MalformedForm(String),

    /// フォームに`name`または`file`フィールドが含まれていない
    #[error("A deck name and a JSON or Excel (.xlsx) file with the cards are required")]
    MissingUploadFields,

    /// 拡張子から形式を判定できず、JSONとXLSXの両方で読み込みに失敗した
    #[error(
        "The file could not be processed. Upload a JSON array of objects or an Excel (.xlsx) \
         workbook with headers in the first row"
    )]
    UnsupportedFormat,

    /// JSONとして解析できない（UTF-8として不正な場合を含む）
    #[error("The JSON file must contain an array of objects")]
    InvalidJson(#[source] serde_json::Error),

    /// トップレベルの値が配列ではない
    #[error("The JSON document must be an array of objects")]
    NotAnArray,

    /// 配列の要素がオブジェクトではない
    #[error("Every card in the JSON must be an object with key/value pairs (entry {index})")]
    InvalidEntry {
        /// 問題のある要素のインデックス（0始まり）
        index: usize,
    },

    /// 配列が空
    #[error("The file does not contain any cards")]
    EmptyInput,

    /// ZIPアーカイブとして読み込めない
    #[error("The Excel (.xlsx) file is invalid or corrupted: {0}")]
    CorruptArchive(String),

    /// `xl/workbook.xml`が存在しない
    #[error("The Excel file does not contain a valid workbook")]
    MissingWorkbook,

    /// ワークブックに`<sheet>`要素が存在しない
    #[error("The Excel file does not contain any worksheets")]
    NoSheets,

    /// 最初のシートにリレーションシップIDがない
    #[error("Could not determine the primary worksheet of the Excel file")]
    MissingRelationshipId,

    /// `xl/_rels/workbook.xml.rels`が存在しない
    #[error("The Excel file does not contain valid workbook relationships")]
    MissingRelationships,

    /// リレーションシップIDに対応するターゲットが見つからない
    #[error("Could not find the worksheet referenced in the Excel file (relationship '{id}')")]
    UnresolvedSheetTarget {
        /// 解決できなかったリレーションシップID
        id: String,
    },

    /// 解決したシートのパスがアーカイブ内に存在しない
    #[error("Could not read the primary worksheet of the Excel file ('{path}')")]
    MissingSheetData {
        /// アーカイブ内のシートパス
        path: String,
    },

    /// シートに`<row>`要素が存在しない
    #[error("The Excel file does not contain any data rows")]
    NoRows,

    /// ヘッダー行にセルが存在しない
    #[error("The first row of the Excel file must contain headers")]
    EmptyHeaderRow,

    /// ヘッダー行以降にレコードが存在しない
    #[error("The Excel file contains no cards after the header row")]
    NoDataRows,

    /// 必須のXMLパートが整形式ではない
    #[error("Malformed XML in '{part}': {message}")]
    MalformedXml {
        /// アーカイブ内のパート名
        part: String,
        /// quick-xml由来の詳細メッセージ
        message: String,
    },

    /// アーカイブがセキュリティ制限に違反した
    ///
    /// ZIP bomb攻撃、パストラバーサル攻撃などの対策として、エントリ数やサイズの
    /// 上限を超えた場合に発生します。
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 組み立て対象のレコードが0件
    #[error("No cards could be assembled from the file")]
    EmptyResult,

    /// 設定の検証に失敗した
    ///
    /// `ImporterBuilder::build()`時に設定を検証し、無効な設定が検出された場合に発生します。
    #[error("Configuration error: {0}")]
    Config(String),
}

/// 機械判定用のエラーコード
///
/// `as_str()`はスネークケースの安定した文字列を返します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    MalformedForm,
    MissingUploadFields,
    UnsupportedFormat,
    InvalidJson,
    NotAnArray,
    InvalidEntry,
    EmptyInput,
    CorruptArchive,
    MissingWorkbook,
    NoSheets,
    MissingRelationshipId,
    MissingRelationships,
    UnresolvedSheetTarget,
    MissingSheetData,
    NoRows,
    EmptyHeaderRow,
    NoDataRows,
    MalformedXml,
    SecurityViolation,
    EmptyResult,
    Config,
}

impl ErrorCode {
    /// 安定したコード文字列を取得
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MalformedForm => "malformed_form",
            ErrorCode::MissingUploadFields => "missing_upload_fields",
            ErrorCode::UnsupportedFormat => "unsupported_format",
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::NotAnArray => "not_an_array",
            ErrorCode::InvalidEntry => "invalid_entry",
            ErrorCode::EmptyInput => "empty_input",
            ErrorCode::CorruptArchive => "corrupt_archive",
            ErrorCode::MissingWorkbook => "missing_workbook",
            ErrorCode::NoSheets => "no_sheets",
            ErrorCode::MissingRelationshipId => "missing_relationship_id",
            ErrorCode::MissingRelationships => "missing_relationships",
            ErrorCode::UnresolvedSheetTarget => "unresolved_sheet_target",
            ErrorCode::MissingSheetData => "missing_sheet_data",
            ErrorCode::NoRows => "no_rows",
            ErrorCode::EmptyHeaderRow => "empty_header_row",
            ErrorCode::NoDataRows => "no_data_rows",
            ErrorCode::MalformedXml => "malformed_xml",
            ErrorCode::SecurityViolation => "security_violation",
            ErrorCode::EmptyResult => "empty_result",
            ErrorCode::Config => "config",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ImportError {
    /// エラーの種類を表すコードを取得
    pub fn code(&self) -> ErrorCode {
        match self {
            ImportError::MalformedForm(_) => ErrorCode::MalformedForm,
            ImportError::MissingUploadFields => ErrorCode::MissingUploadFields,
            ImportError::UnsupportedFormat => ErrorCode::UnsupportedFormat,
            ImportError::InvalidJson(_) => ErrorCode::InvalidJson,
            ImportError::NotAnArray => ErrorCode::NotAnArray,
            ImportError::InvalidEntry { .. } => ErrorCode::InvalidEntry,
            ImportError::EmptyInput => ErrorCode::EmptyInput,
            ImportError::CorruptArchive(_) => ErrorCode::CorruptArchive,
            ImportError::MissingWorkbook => ErrorCode::MissingWorkbook,
            ImportError::NoSheets => ErrorCode::NoSheets,
            ImportError::MissingRelationshipId => ErrorCode::MissingRelationshipId,
            ImportError::MissingRelationships => ErrorCode::MissingRelationships,
            ImportError::UnresolvedSheetTarget { .. } => ErrorCode::UnresolvedSheetTarget,
            ImportError::MissingSheetData { .. } => ErrorCode::MissingSheetData,
            ImportError::NoRows => ErrorCode::NoRows,
            ImportError::EmptyHeaderRow => ErrorCode::EmptyHeaderRow,
            ImportError::NoDataRows => ErrorCode::NoDataRows,
            ImportError::MalformedXml { .. } => ErrorCode::MalformedXml,
            ImportError::SecurityViolation(_) => ErrorCode::SecurityViolation,
            ImportError::EmptyResult => ErrorCode::EmptyResult,
            ImportError::Config(_) => ErrorCode::Config,
        }
    }

    pub(crate) fn malformed_form(message: impl Into<String>) -> Self {
        ImportError::MalformedForm(message.into())
    }

    pub(crate) fn malformed_xml(part: &str, err: impl fmt::Display) -> Self {
        ImportError::MalformedXml {
            part: part.to_string(),
            message: err.to_string(),
        }
    }
}

/// HTTPレスポンス用に`{"code": ..., "message": ...}`としてシリアライズする
impl Serialize for ImportError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ImportError", 2)?;
        state.serialize_field("code", self.code().as_str())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
