//! Part Header Parsing
//!
//! `Content-Type`や`Content-Disposition`のような「値; key=value」形式の
//! ヘッダーと、パートごとのヘッダーブロックを解析します。

use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexMap;

use crate::error::ImportError;

/// パラメータ付きヘッダー値
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParamHeader {
    /// 小文字化した主値（例: `multipart/form-data`）
    pub value: String,
    /// パラメータ（キーは小文字化済み、出現順）
    pub params: Vec<(String, String)>,
}

impl ParamHeader {
    /// ヘッダー値を解析する
    ///
    /// 引用符で囲まれた値の中の`;`は区切りとして扱いません。
    pub fn parse(raw: &str) -> Self {
        let mut segments = split_unquoted(raw, ';').into_iter();
        let value = segments
            .next()
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();

        let params = segments
            .filter_map(|segment| {
                let (key, val) = segment.split_once('=')?;
                let key = key.trim().to_ascii_lowercase();
                if key.is_empty() {
                    return None;
                }
                Some((key, unquote(val.trim())))
            })
            .collect();

        Self { value, params }
    }

    /// パラメータ値を取得（キーは大文字小文字を区別しない）
    pub fn param(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// RFC 2231の拡張パラメータ（`key*`）を優先して取得
    pub fn extended_param(&self, key: &str) -> Option<String> {
        self.param(&format!("{}*", key))
            .map(decode_extended_value)
            .or_else(|| self.param(key).map(str::to_string))
    }
}

fn split_unquoted(raw: &str, separator: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, ch) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => {
                segments.push(&raw[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&raw[start..]);
    segments
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// `charset'language'percent-encoded`形式の値をデコードする
fn decode_extended_value(value: &str) -> String {
    let mut pieces = value.splitn(3, '\'');
    let (charset, encoded) = match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(charset), Some(_language), Some(encoded)) => (charset, encoded),
        _ => ("utf-8", value),
    };

    let bytes = percent_decode(encoded);
    let encoding = Encoding::for_label(charset.as_bytes()).unwrap_or(UTF_8);
    encoding.decode_without_bom_handling(&bytes).0.into_owned()
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

pub(crate) fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// パートのヘッダーブロック（空行の手前まで）を解析する
///
/// 先頭が空白・タブの行は直前のヘッダーの続き（折り返し）として連結します。
/// 同名のヘッダーは後勝ちで、名前は元の大文字小文字を保持します。
pub(crate) fn parse_header_block(block: &[u8]) -> Result<IndexMap<String, String>, ImportError> {
    let text = String::from_utf8_lossy(block);
    let mut headers: IndexMap<String, String> = IndexMap::new();
    let mut last_key: Option<String> = None;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            let value = last_key
                .as_ref()
                .and_then(|key| headers.get_mut(key))
                .ok_or_else(|| {
                    ImportError::malformed_form("header continuation without a header")
                })?;
            value.push(' ');
            value.push_str(line.trim());
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ImportError::malformed_form(format!("invalid part header: {}", line)))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ImportError::malformed_form("empty part header name"));
        }

        // 大文字小文字違いの既存キーは置き換える
        if let Some(existing) = find_key(&headers, name) {
            headers.shift_remove(&existing);
        }
        headers.insert(name.to_string(), value.trim().to_string());
        last_key = Some(name.to_string());
    }

    Ok(headers)
}

fn find_key(headers: &IndexMap<String, String>, name: &str) -> Option<String> {
    headers
        .keys()
        .find(|k| k.eq_ignore_ascii_case(name))
        .cloned()
}

/// ヘッダーを大文字小文字を区別せずに取得
pub(crate) fn find_header<'a>(headers: &'a IndexMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_type() {
        let header = ParamHeader::parse("Multipart/Form-Data; boundary=----WebKitFormBoundaryX");
        assert_eq!(header.value, "multipart/form-data");
        assert_eq!(header.param("BOUNDARY"), Some("----WebKitFormBoundaryX"));
    }

    #[test]
    fn test_quoted_params_with_separators() {
        let header =
            ParamHeader::parse(r#"form-data; name="file"; filename="a; b \"c\".json""#);
        assert_eq!(header.value, "form-data");
        assert_eq!(header.param("name"), Some("file"));
        assert_eq!(header.param("filename"), Some(r#"a; b "c".json"#));
    }

    #[test]
    fn test_extended_filename_takes_precedence() {
        let header = ParamHeader::parse(
            "form-data; name=file; filename=\"fallback.json\"; filename*=UTF-8''tarjetas%20espa%C3%B1ol.json",
        );
        assert_eq!(
            header.extended_param("filename").as_deref(),
            Some("tarjetas español.json")
        );
        assert_eq!(header.extended_param("name").as_deref(), Some("file"));
    }

    #[test]
    fn test_percent_decode_keeps_invalid_sequences() {
        assert_eq!(percent_decode("100%"), b"100%".to_vec());
        assert_eq!(percent_decode("%zz%41"), b"%zzA".to_vec());
    }

    #[test]
    fn test_parse_header_block_with_folding() {
        let block = b"Content-Disposition: form-data;\r\n name=\"file\"\r\nContent-Type: application/json\r\n";
        let headers = parse_header_block(block).unwrap();

        assert_eq!(
            find_header(&headers, "content-disposition"),
            Some("form-data; name=\"file\"")
        );
        assert_eq!(find_header(&headers, "CONTENT-TYPE"), Some("application/json"));
        let names: Vec<_> = headers.keys().cloned().collect();
        assert_eq!(names, vec!["Content-Disposition", "Content-Type"]);
    }

    #[test]
    fn test_header_without_colon_is_malformed() {
        let result = parse_header_block(b"Content-Disposition form-data\r\n");
        assert!(matches!(result, Err(ImportError::MalformedForm(_))));
    }

    #[test]
    fn test_leading_continuation_is_malformed() {
        let result = parse_header_block(b" folded\r\n");
        assert!(matches!(result, Err(ImportError::MalformedForm(_))));
    }
}
