//! Payload Decoding
//!
//! パート本文の転送エンコーディング（base64 / quoted-printable）と
//! テキストフィールドの文字コード変換を扱います。

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use encoding_rs::{Encoding, UTF_8};
use tracing::warn;

use crate::multipart::headers::hex_value;

/// `Content-Transfer-Encoding`に従って本文をデコードする
///
/// デコードできない場合は警告を出して元のバイト列を返します。
pub(crate) fn decode_transfer_encoding(encoding: Option<&str>, payload: &[u8]) -> Vec<u8> {
    let encoding = encoding.map(|e| e.trim().to_ascii_lowercase());
    match encoding.as_deref() {
        Some("base64") => {
            let compact: Vec<u8> = payload
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            match STANDARD.decode(&compact) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(error = %e, "invalid base64 payload, keeping raw bytes");
                    payload.to_vec()
                }
            }
        }
        Some("quoted-printable") => decode_quoted_printable(payload),
        _ => payload.to_vec(),
    }
}

fn decode_quoted_printable(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len());
    let mut i = 0;
    while i < payload.len() {
        let b = payload[i];
        if b != b'=' {
            out.push(b);
            i += 1;
            continue;
        }

        let rest = &payload[i + 1..];
        // ソフト改行
        if rest.starts_with(b"\r\n") {
            i += 3;
        } else if rest.starts_with(b"\n") {
            i += 2;
        } else if let [hi, lo, ..] = rest {
            match (hex_value(*hi), hex_value(*lo)) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 3;
                }
                _ => {
                    out.push(b);
                    i += 1;
                }
            }
        } else {
            out.push(b);
            i += 1;
        }
    }
    out
}

/// テキストフィールドの本文を文字列に変換する
///
/// 不正なバイト列は置換文字になり、未知の文字コード名はUTF-8として扱います。
pub(crate) fn decode_text(payload: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);
    encoding
        .decode_without_bom_handling(payload)
        .0
        .into_owned()
}
