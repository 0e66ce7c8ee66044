//! Boundary Scanner
//!
//! multipartボディを境界文字列で分割する状態機械。
//! 状態は「境界の探索」「パートヘッダーの読み込み」「パート本文の読み込み」の3つです。

use indexmap::IndexMap;

use crate::error::ImportError;
use crate::multipart::headers::parse_header_block;

/// 分割済みのパート（ヘッダーと未デコードの本文）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawPart<'a> {
    pub headers: IndexMap<String, String>,
    pub payload: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingBoundary,
    ReadingPartHeaders,
    ReadingPartBody,
    Finished,
}

/// ボディをパートに分割する
///
/// 最初の境界より前（プリアンブル）と終端境界より後（エピローグ）は無視します。
/// 終端境界（`--boundary--`）がない場合は`ImportError::MalformedForm`です。
pub(crate) fn split_parts<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<RawPart<'a>>, ImportError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let mut parts = Vec::new();
    let mut state = ScanState::SeekingBoundary;
    let mut pos = 0;
    let mut headers = IndexMap::new();

    loop {
        state = match state {
            ScanState::SeekingBoundary => {
                let start = find_opening_delimiter(body, &delimiter)
                    .ok_or_else(|| ImportError::malformed_form("opening boundary not found"))?;
                pos = start + delimiter.len();
                after_delimiter(body, &mut pos)?
            }
            ScanState::ReadingPartHeaders => {
                let (block, next) = header_block(body, pos)?;
                headers = parse_header_block(block)?;
                pos = next;
                ScanState::ReadingPartBody
            }
            ScanState::ReadingPartBody => {
                let (end, resume) = find_next_delimiter(body, &delimiter, pos)
                    .ok_or_else(|| ImportError::malformed_form("missing terminal boundary"))?;
                parts.push(RawPart {
                    headers: std::mem::take(&mut headers),
                    payload: &body[pos..end],
                });
                pos = resume;
                after_delimiter(body, &mut pos)?
            }
            ScanState::Finished => break,
        };
    }

    Ok(parts)
}

/// 行頭にある最初の境界の位置
fn find_opening_delimiter(body: &[u8], delimiter: &[u8]) -> Option<usize> {
    let mut from = 0;
    while let Some(offset) = find(&body[from..], delimiter) {
        let at = from + offset;
        if (at == 0 || body[at - 1] == b'\n') && is_delimiter_end(body, at + delimiter.len()) {
            return Some(at);
        }
        from = at + 1;
    }
    None
}

/// `pos`以降で次の境界を探す
///
/// # 戻り値
///
/// (本文の終端 = 境界直前の改行の位置, 境界の直後の位置)
fn find_next_delimiter(body: &[u8], delimiter: &[u8], pos: usize) -> Option<(usize, usize)> {
    let mut from = pos;
    while from <= body.len() {
        let offset = find(&body[from..], delimiter)?;
        let at = from + offset;
        let after = at + delimiter.len();
        if at > 0 && body[at - 1] == b'\n' && is_delimiter_end(body, after) {
            let mut end = at - 1;
            if end > 0 && body[end - 1] == b'\r' {
                end -= 1;
            }
            // 空の本文では改行がヘッダー終端と共有される
            return Some((end.max(pos), after));
        }
        from = at + 1;
    }
    None
}

/// 境界の直後として妥当な位置か（本文中の偶然の一致を除外する）
fn is_delimiter_end(body: &[u8], after: usize) -> bool {
    match body.get(after) {
        None => true,
        Some(b) => matches!(b, b'-' | b'\r' | b'\n' | b' ' | b'\t'),
    }
}

/// 境界の直後を読み、次の状態を決める
fn after_delimiter(body: &[u8], pos: &mut usize) -> Result<ScanState, ImportError> {
    let rest = &body[*pos..];
    if rest.starts_with(b"--") {
        return Ok(ScanState::Finished);
    }

    // トランスポートパディング
    let padding = rest.iter().take_while(|b| **b == b' ' || **b == b'\t').count();
    let rest = &rest[padding..];
    let newline = if rest.starts_with(b"\r\n") {
        2
    } else if rest.starts_with(b"\n") {
        1
    } else if rest.is_empty() {
        return Err(ImportError::malformed_form("missing terminal boundary"));
    } else {
        return Err(ImportError::malformed_form("unexpected data after boundary"));
    };

    *pos += padding + newline;
    Ok(ScanState::ReadingPartHeaders)
}

/// ヘッダーブロックを切り出す
///
/// # 戻り値
///
/// (ヘッダーブロック, 空行の直後の位置)
fn header_block(body: &[u8], pos: usize) -> Result<(&[u8], usize), ImportError> {
    let mut line_start = pos;
    loop {
        let newline = find(&body[line_start..], b"\n")
            .map(|offset| line_start + offset)
            .ok_or_else(|| ImportError::malformed_form("unterminated part headers"))?;
        let line = &body[line_start..newline];
        if line.is_empty() || line == b"\r" {
            return Ok((&body[pos..line_start], newline + 1));
        }
        line_start = newline + 1;
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
