//! JSON Import Module
//!
//! JSON配列（オブジェクトの配列）をレコード列として読み込みます。

use serde_json::Value;

use crate::error::ImportError;
use crate::types::RawRecord;

/// バイト列をJSON配列として読み込む
///
/// # 戻り値
///
/// * `Ok(Vec<RawRecord>)` - 要素ごとに1件、順序を保持
/// * `Err(ImportError::InvalidJson)` - UTF-8またはJSONとして不正
/// * `Err(ImportError::NotAnArray)` - トップレベルが配列ではない
/// * `Err(ImportError::InvalidEntry)` - オブジェクト以外の要素を含む
/// * `Err(ImportError::EmptyInput)` - 空配列
pub(crate) fn read_json_records(bytes: &[u8]) -> Result<Vec<RawRecord>, ImportError> {
    let payload: Value = serde_json::from_slice(bytes).map_err(ImportError::InvalidJson)?;

    let Value::Array(entries) = payload else {
        return Err(ImportError::NotAnArray);
    };

    let records = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::Object(map) => Ok(map),
            _ => Err(ImportError::InvalidEntry { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(ImportError::EmptyInput);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_record_per_element_in_order() {
        let json = r#"[{"q":"hola","a":"hello"},{"q":"adiós","a":"bye"}]"#;
        let records = read_json_records(json.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(Value::Object(records[0].clone()), json!({"q": "hola", "a": "hello"}));
        assert_eq!(Value::Object(records[1].clone()), json!({"q": "adiós", "a": "bye"}));
    }

    #[test]
    fn test_key_order_is_preserved() {
        let records = read_json_records(br#"[{"z":1,"a":2,"m":3}]"#).unwrap();
        let keys: Vec<_> = records[0].keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_nested_values_are_kept() {
        let records = read_json_records(br#"[{"tags":["a","b"],"meta":{"x":null}}]"#).unwrap();
        assert_eq!(
            Value::Object(records[0].clone()),
            json!({"tags": ["a", "b"], "meta": {"x": null}})
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            read_json_records(b"[{\"q\":"),
            Err(ImportError::InvalidJson(_))
        ));
        assert!(matches!(
            read_json_records(&[0xff, 0xfe, b'[', b']']),
            Err(ImportError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_not_an_array() {
        assert!(matches!(
            read_json_records(br#"{"q":"hola"}"#),
            Err(ImportError::NotAnArray)
        ));
    }

    #[test]
    fn test_invalid_entry_reports_index() {
        match read_json_records(br#"[{"q":1}, 2]"#) {
            Err(ImportError::InvalidEntry { index }) => assert_eq!(index, 1),
            e => panic!("Unexpected result: {:?}", e),
        }
    }

    #[test]
    fn test_empty_array() {
        assert!(matches!(read_json_records(b"[]"), Err(ImportError::EmptyInput)));
    }
}
