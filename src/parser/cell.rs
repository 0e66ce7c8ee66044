//! Cell Value Decoder Module
//!
//! `<c>`要素の型属性と値から`CellValue`を得るモジュール。
//! 列記号の変換と数値推定は純粋関数として分離しています。

use tracing::debug;

use crate::parser::xml::XmlElement;
use crate::types::CellValue;

/// セル参照の英字部分から0始まりの列インデックスを求める
///
/// A=1, B=2, ..., Z=26, AA=27 ... の26進数として解釈し、1を引きます。
/// 英字を含まない参照（属性欠落を含む）は列0として扱います。
///
/// # 使用例
///
/// ```text
/// "A1"   -> 0
/// "Z9"   -> 25
/// "AA10" -> 26
/// ```
pub(crate) fn column_index(cell_ref: &str) -> usize {
    let index = cell_ref
        .chars()
        .filter(char::is_ascii_alphabetic)
        .fold(0usize, |acc, ch| {
            let digit = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
            acc.saturating_mul(26).saturating_add(digit)
        });
    index.saturating_sub(1)
}

/// 数値型セルのテキストを型推定する
///
/// * 空白のみ -> 空文字列
/// * `-?[0-9]+` -> 整数（ただし先頭が`0`かつ2文字以上なら文字列のまま）
/// * `-?[0-9]+\.[0-9]+` -> 浮動小数点数
/// * その他 -> トリム済みの文字列
pub(crate) fn coerce_numeric(raw: &str) -> CellValue {
    let text = raw.trim();
    if text.is_empty() {
        return CellValue::empty();
    }

    if is_integer_literal(text) {
        // 郵便番号やIDの先頭ゼロを保持する
        if text.starts_with('0') && text.len() > 1 {
            return CellValue::Text(text.to_string());
        }
        return text
            .parse::<i64>()
            .map(CellValue::Integer)
            .unwrap_or_else(|_| CellValue::Text(text.to_string()));
    }

    if is_decimal_literal(text) {
        return match text.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(text.to_string()),
        };
    }

    CellValue::Text(text.to_string())
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_integer_literal(text: &str) -> bool {
    all_digits(text.strip_prefix('-').unwrap_or(text))
}

fn is_decimal_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    match unsigned.split_once('.') {
        Some((int_part, frac_part)) => all_digits(int_part) && all_digits(frac_part),
        None => false,
    }
}

/// `<c>`要素の値をデコードする
///
/// 共有文字列インデックスが解決できない場合など、セル単位の異常は
/// 空文字列として回復し、エラーにはしません。
pub(crate) fn decode_cell(cell: &XmlElement, shared_strings: &[String]) -> CellValue {
    let cell_type = cell.attr("t");

    if cell_type == Some("inlineStr") {
        let text = cell
            .children_named("is")
            .map(|is| is.descendant_text("t"))
            .collect::<String>();
        return CellValue::Text(text);
    }

    let value_node = cell.child("v");

    match cell_type {
        Some("s") => {
            let Some(node) = value_node else {
                return CellValue::empty();
            };
            let resolved = node
                .text
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| shared_strings.get(idx));
            match resolved {
                Some(s) => CellValue::Text(s.clone()),
                None => {
                    debug!(
                        cell = cell.attr("r").unwrap_or_default(),
                        value = %node.text,
                        "unresolvable shared string index"
                    );
                    CellValue::empty()
                }
            }
        }
        Some("b") => {
            let is_true = value_node.is_some_and(|node| node.text == "1");
            CellValue::Text(if is_true { "TRUE" } else { "FALSE" }.to_string())
        }
        _ => match value_node {
            Some(node) => coerce_numeric(&node.text),
            None => CellValue::empty(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(xml: &str) -> XmlElement {
        XmlElement::parse("cell", xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), 0);
        assert_eq!(column_index("B7"), 1);
        assert_eq!(column_index("Z1"), 25);
        assert_eq!(column_index("AA1"), 26);
        assert_eq!(column_index("AZ3"), 51);
        assert_eq!(column_index("XFD1048576"), 16_383);
        assert_eq!(column_index("c5"), 2);
    }

    #[test]
    fn test_column_index_without_letters() {
        assert_eq!(column_index(""), 0);
        assert_eq!(column_index("15"), 0);
    }

    #[test]
    fn test_coerce_integers() {
        assert_eq!(coerce_numeric("7"), CellValue::Integer(7));
        assert_eq!(coerce_numeric(" 42 "), CellValue::Integer(42));
        assert_eq!(coerce_numeric("-13"), CellValue::Integer(-13));
        assert_eq!(coerce_numeric("0"), CellValue::Integer(0));
    }

    #[test]
    fn test_coerce_keeps_leading_zero() {
        assert_eq!(coerce_numeric("007"), CellValue::Text("007".to_string()));
        assert_eq!(coerce_numeric("00"), CellValue::Text("00".to_string()));
        // 符号付きは先頭ゼロ規則の対象外
        assert_eq!(coerce_numeric("-07"), CellValue::Integer(-7));
    }

    #[test]
    fn test_coerce_floats() {
        assert_eq!(coerce_numeric("7.50"), CellValue::Float(7.5));
        assert_eq!(coerce_numeric("-0.25"), CellValue::Float(-0.25));
        assert_eq!(coerce_numeric("0.5"), CellValue::Float(0.5));
    }

    #[test]
    fn test_coerce_other_text() {
        assert_eq!(coerce_numeric("   "), CellValue::empty());
        assert_eq!(coerce_numeric("1.5E+20"), CellValue::Text("1.5E+20".to_string()));
        assert_eq!(coerce_numeric("+5"), CellValue::Text("+5".to_string()));
        assert_eq!(coerce_numeric("5."), CellValue::Text("5.".to_string()));
        assert_eq!(coerce_numeric(" #DIV/0! "), CellValue::Text("#DIV/0!".to_string()));
    }

    #[test]
    fn test_coerce_integer_overflow_kept_as_text() {
        let huge = "123456789012345678901234567890";
        assert_eq!(coerce_numeric(huge), CellValue::Text(huge.to_string()));
    }

    #[test]
    fn test_decode_shared_string() {
        let shared = vec!["hola".to_string(), "adiós".to_string()];
        assert_eq!(
            decode_cell(&cell(r#"<c r="A1" t="s"><v>1</v></c>"#), &shared),
            CellValue::Text("adiós".to_string())
        );
        assert_eq!(
            decode_cell(&cell(r#"<c r="A1" t="s"><v>9</v></c>"#), &shared),
            CellValue::empty()
        );
        assert_eq!(
            decode_cell(&cell(r#"<c r="A1" t="s"><v>x</v></c>"#), &shared),
            CellValue::empty()
        );
        assert_eq!(
            decode_cell(&cell(r#"<c r="A1" t="s"/>"#), &shared),
            CellValue::empty()
        );
    }

    #[test]
    fn test_decode_boolean() {
        assert_eq!(
            decode_cell(&cell(r#"<c t="b"><v>1</v></c>"#), &[]),
            CellValue::Text("TRUE".to_string())
        );
        assert_eq!(
            decode_cell(&cell(r#"<c t="b"><v>0</v></c>"#), &[]),
            CellValue::Text("FALSE".to_string())
        );
        assert_eq!(
            decode_cell(&cell(r#"<c t="b"/>"#), &[]),
            CellValue::Text("FALSE".to_string())
        );
    }

    #[test]
    fn test_decode_inline_string() {
        let xml = r#"<c r="B2" t="inlineStr"><is><r><t>Buenos </t></r><r><t>días</t></r></is></c>"#;
        assert_eq!(
            decode_cell(&cell(xml), &[]),
            CellValue::Text("Buenos días".to_string())
        );
    }

    #[test]
    fn test_decode_inline_string_with_phonetic_run() {
        let xml = r#"<c r="A2" t="inlineStr"><is><t>漢</t><rPh sb="0" eb="1"><t>かん</t></rPh></is></c>"#;
        assert_eq!(
            decode_cell(&cell(xml), &[]),
            CellValue::Text("漢かん".to_string())
        );
    }

    #[test]
    fn test_decode_numeric_default() {
        assert_eq!(
            decode_cell(&cell(r#"<c r="A2"><v>007</v></c>"#), &[]),
            CellValue::Text("007".to_string())
        );
        assert_eq!(
            decode_cell(&cell(r#"<c r="A2" t="n"><v>7</v></c>"#), &[]),
            CellValue::Integer(7)
        );
        assert_eq!(
            decode_cell(&cell(r#"<c r="A2"><v>7.50</v></c>"#), &[]),
            CellValue::Float(7.5)
        );
        assert_eq!(
            decode_cell(&cell(r#"<c r="A2" t="str"><f>A1</f><v>abc</v></c>"#), &[]),
            CellValue::Text("abc".to_string())
        );
        assert_eq!(
            decode_cell(&cell(r#"<c r="A2" s="3"/>"#), &[]),
            CellValue::empty()
        );
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        /// 0始まりの列番号をA1記法の列文字に変換（検証用）
        fn column_letters(mut index: usize) -> String {
            let mut letters = Vec::new();
            loop {
                letters.push(b'A' + (index % 26) as u8);
                if index < 26 {
                    break;
                }
                index = index / 26 - 1;
            }
            letters.reverse();
            String::from_utf8(letters).unwrap()
        }

        proptest! {
            #[test]
            fn test_column_index_inverts_letters(col in 0usize..16_384, row in 1u32..1_048_577) {
                let cell_ref = format!("{}{}", column_letters(col), row);
                prop_assert_eq!(column_index(&cell_ref), col);
                prop_assert_eq!(column_index(&cell_ref.to_ascii_lowercase()), col);
            }

            #[test]
            fn test_column_index_never_panics(s in "\\PC*") {
                let _ = column_index(&s);
            }

            #[test]
            fn test_coerce_integers_without_leading_zero(n in any::<i64>()) {
                prop_assert_eq!(coerce_numeric(&n.to_string()), CellValue::Integer(n));
            }

            #[test]
            fn test_coerce_leading_zero_stays_text(digits in "0[0-9]{1,12}") {
                prop_assert_eq!(coerce_numeric(&digits), CellValue::Text(digits.clone()));
            }

            #[test]
            fn test_coerce_decimals(int in 0u32..1_000_000, frac in 0u32..1000) {
                let text = format!("{}.{:03}", int, frac);
                let expected: f64 = text.parse().unwrap();
                prop_assert_eq!(coerce_numeric(&text), CellValue::Float(expected));
            }

            #[test]
            fn test_coerce_result_is_trimmed(s in "[ a-z0-9.#-]{0,16}") {
                match coerce_numeric(&s) {
                    CellValue::Text(text) => prop_assert_eq!(text.as_str(), s.trim()),
                    CellValue::Integer(_) | CellValue::Float(_) => {}
                }
            }
        }
    }
}
