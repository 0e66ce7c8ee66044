//! Shared String Table Module
//!
//! `xl/sharedStrings.xml`を解析し、インデックスで参照できる文字列表を構築します。

use crate::error::ImportError;
use crate::parser::package::PackageReader;
use crate::parser::xml::XmlElement;

pub(crate) const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// 共有文字列表を読み込む
///
/// パートが存在しない場合は空の表を返します（エラーではありません）。
pub(crate) fn load_shared_strings<P: PackageReader>(
    package: &mut P,
) -> Result<Vec<String>, ImportError> {
    match package.read_part(SHARED_STRINGS_PART)? {
        Some(xml) => {
            let root = XmlElement::parse(SHARED_STRINGS_PART, &xml)?;
            Ok(shared_strings_from(&root))
        }
        None => Ok(Vec::new()),
    }
}

/// `<sst>`要素から文字列表を構築する
///
/// 各`<si>`配下のすべての`<t>`テキスト（ふりがな`<rPh>`を含む）を文書順に
/// 連結して1エントリとします。リッチテキストの書式は無視します。
pub(crate) fn shared_strings_from(sst: &XmlElement) -> Vec<String> {
    sst.children_named("si")
        .map(|si| si.descendant_text("t"))
        .collect()
}
