//! Multipart Form Module
//!
//! `multipart/form-data`のリクエストボディを、名前付きのテキスト／ファイル
//! フィールドに分解するモジュール。ネットワークI/Oは行いません。

mod encoding;
mod headers;
mod scanner;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::ImportError;
use encoding::{decode_text, decode_transfer_encoding};
use headers::{find_header, ParamHeader};
use scanner::{split_parts, RawPart};

/// テキストフィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub name: String,
    pub value: String,
}

/// ファイルフィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileField {
    pub name: String,
    pub filename: String,
    /// 宣言されたメディアタイプ（未指定時は`text/plain`）
    pub content_type: String,
    /// パートのヘッダー（名前は元の表記、出現順）
    pub headers: IndexMap<String, String>,
    /// 転送エンコーディングをデコードした本文
    pub bytes: Vec<u8>,
}

impl FileField {
    /// ヘッダーを大文字小文字を区別せずに取得
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// フォームの1フィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    Text(TextField),
    File(FileField),
}

impl MultipartField {
    /// フィールド名
    pub fn name(&self) -> &str {
        match self {
            MultipartField::Text(field) => &field.name,
            MultipartField::File(field) => &field.name,
        }
    }
}

/// デコード済みのフォーム
///
/// 同名のフィールドは到着順に保持され、アクセサは最初のものを返します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: IndexMap<String, Vec<MultipartField>>,
}

impl Form {
    /// リクエストボディとContent-Typeからフォームをデコードする
    ///
    /// # 引数
    ///
    /// * `body` - 生のリクエストボディ
    /// * `content_type` - `Content-Type`ヘッダーの値（`boundary`パラメータを含む）
    ///
    /// # 戻り値
    ///
    /// * `Ok(Form)` - デコードに成功した場合
    /// * `Err(ImportError::MalformedForm)` - Content-Typeが`multipart/form-data`でない、
    ///   境界が取得できない、終端境界がない、またはパートが不正な場合
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use deckimport::Form;
    ///
    /// # fn main() -> Result<(), deckimport::ImportError> {
    /// let body = b"--b\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nVerbs\r\n--b--\r\n";
    /// let form = Form::parse(body, "multipart/form-data; boundary=b")?;
    /// assert_eq!(form.get_first("name"), Some("Verbs"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(body: &[u8], content_type: &str) -> Result<Self, ImportError> {
        let header = ParamHeader::parse(content_type);
        if header.value != "multipart/form-data" {
            return Err(ImportError::malformed_form(format!(
                "expected multipart/form-data, got '{}'",
                header.value
            )));
        }
        let boundary = header
            .param("boundary")
            .filter(|b| !b.is_empty())
            .ok_or_else(|| ImportError::malformed_form("missing boundary parameter"))?;

        let mut form = Form::default();
        for part in split_parts(body, boundary)? {
            let field = decode_part(part)?;
            form.add_field(field);
        }

        debug!(fields = form.len(), size = body.len(), "decoded multipart form");
        Ok(form)
    }

    fn add_field(&mut self, field: MultipartField) {
        self.fields
            .entry(field.name().to_string())
            .or_default()
            .push(field);
    }

    /// 最初のフィールドがテキストならその値を返す
    pub fn get_first(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            MultipartField::Text(field) => Some(&field.value),
            MultipartField::File(_) => None,
        }
    }

    /// 指定名の最初のフィールド
    pub fn get(&self, name: &str) -> Option<&MultipartField> {
        self.fields.get(name).and_then(|fields| fields.first())
    }

    /// 指定名のすべてのフィールド（到着順）
    pub fn get_all(&self, name: &str) -> &[MultipartField] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// 最初のフィールドがファイルならそれを返す
    pub fn file(&self, name: &str) -> Option<&FileField> {
        match self.get(name)? {
            MultipartField::File(field) => Some(field),
            MultipartField::Text(_) => None,
        }
    }

    /// 指定名のフィールドが存在するか
    pub fn contains(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|fields| !fields.is_empty())
    }

    /// フィールド名の数
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// すべてのフィールドを到着順に列挙する
    pub fn iter(&self) -> impl Iterator<Item = &MultipartField> {
        self.fields.values().flatten()
    }
}

fn decode_part(part: RawPart<'_>) -> Result<MultipartField, ImportError> {
    let disposition = find_header(&part.headers, "Content-Disposition")
        .map(ParamHeader::parse)
        .ok_or_else(|| ImportError::malformed_form("part is missing a Content-Disposition header"))?;
    if disposition.value != "form-data" {
        return Err(ImportError::malformed_form(format!(
            "unexpected Content-Disposition '{}'",
            disposition.value
        )));
    }

    let name = disposition
        .extended_param("name")
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ImportError::malformed_form("form-data part is missing a name"))?;

    let content_type = find_header(&part.headers, "Content-Type").map(ParamHeader::parse);
    let payload = decode_transfer_encoding(
        find_header(&part.headers, "Content-Transfer-Encoding"),
        part.payload,
    );

    // 空のファイル名はテキストフィールドとして扱う
    match disposition.extended_param("filename").filter(|f| !f.is_empty()) {
        Some(filename) => Ok(MultipartField::File(FileField {
            name,
            filename,
            content_type: content_type
                .map(|ct| ct.value)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "text/plain".to_string()),
            headers: part.headers,
            bytes: payload,
        })),
        None => {
            let charset = content_type.as_ref().and_then(|ct| ct.param("charset"));
            Ok(MultipartField::Text(TextField {
                name,
                value: decode_text(&payload, charset),
            }))
        }
    }
}
