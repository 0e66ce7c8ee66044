//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use serde_json::{Map, Number, Value};

/// インポートされた1件分のレコード
///
/// ヘッダー名（またはJSONのキー）から値へのマッピングです。
/// 挿入順（列順・JSONのキー順）が保持されます。
pub type RawRecord = Map<String, Value>;

/// セルの値を表す列挙型
///
/// 真偽値セルは`"TRUE"`/`"FALSE"`の文字列として`Text`に格納されます。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CellValue {
    /// 文字列（空文字列を含む）
    Text(String),

    /// 整数
    Integer(i64),

    /// 浮動小数点数
    Float(f64),
}

impl CellValue {
    /// 空のテキスト値
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// 値が空文字列かどうかを判定
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }

    /// ヘッダー名として使用する文字列に変換
    pub fn to_header_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(n) => n.to_string(),
            // 整数値の浮動小数点数も小数部を残す（"2024.0"）
            CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.1}", f),
            CellValue::Float(f) => f.to_string(),
        }
    }

    /// JSON値に変換
    pub fn into_json(self) -> Value {
        match self {
            CellValue::Text(s) => Value::String(s),
            CellValue::Integer(n) => Value::from(n),
            // 有限値のみ数値として扱う
            CellValue::Float(f) => Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(CellValue::empty().is_blank());
        assert!(!CellValue::Text(" ".to_string()).is_blank());
        assert!(!CellValue::Integer(0).is_blank());
    }

    #[test]
    fn test_to_header_text() {
        assert_eq!(CellValue::Text("Name".to_string()).to_header_text(), "Name");
        assert_eq!(CellValue::Integer(2024).to_header_text(), "2024");
        assert_eq!(CellValue::Float(7.5).to_header_text(), "7.5");
        assert_eq!(CellValue::Float(2024.0).to_header_text(), "2024.0");
        assert_eq!(CellValue::Float(-3.0).to_header_text(), "-3.0");
    }

    #[test]
    fn test_into_json() {
        assert_eq!(CellValue::Integer(7).into_json(), Value::from(7));
        assert_eq!(CellValue::Float(7.5).into_json(), Value::from(7.5));
        assert_eq!(
            CellValue::Text("007".to_string()).into_json(),
            Value::String("007".to_string())
        );
        assert_eq!(
            CellValue::Float(f64::INFINITY).into_json(),
            Value::String("inf".to_string())
        );
    }
}
