//! Workbook Topology Module
//!
//! `xl/workbook.xml`と`xl/_rels/workbook.xml.rels`から、
//! 最初のシートのアーカイブ内パスを解決します。

use tracing::debug;

use crate::error::ImportError;
use crate::parser::package::PackageReader;
use crate::parser::xml::XmlElement;

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// `r:id`属性の名前空間（Transitional / Strict）
const RELATIONSHIP_NAMESPACES: [&str; 2] = [
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    "http://purl.oclc.org/ooxml/officeDocument/relationships",
];

/// 最初のシートのパスを解決する
///
/// # 戻り値
///
/// * `Ok(String)` - 正規化済みのシートパス（例: `xl/worksheets/sheet1.xml`）
/// * `Err(ImportError)` - ワークブック・シート・リレーションシップが欠落している場合
pub(crate) fn locate_primary_sheet<P: PackageReader>(
    package: &mut P,
) -> Result<String, ImportError> {
    let workbook_xml = package
        .read_part(WORKBOOK_PART)?
        .ok_or(ImportError::MissingWorkbook)?;
    let workbook = XmlElement::parse(WORKBOOK_PART, &workbook_xml)?;
    let rel_id = primary_sheet_relationship_id(&workbook)?;

    let rels_xml = package
        .read_part(WORKBOOK_RELS_PART)?
        .ok_or(ImportError::MissingRelationships)?;
    let rels = XmlElement::parse(WORKBOOK_RELS_PART, &rels_xml)?;
    let target = relationship_target(&rels, &rel_id)?;

    let path = normalize_sheet_target(&target);
    debug!(rel_id = %rel_id, target = %target, path = %path, "resolved primary sheet");
    Ok(path)
}

/// 文書順で最初の`<sheet>`要素のリレーションシップIDを取得
pub(crate) fn primary_sheet_relationship_id(workbook: &XmlElement) -> Result<String, ImportError> {
    let sheet = workbook
        .children_named("sheets")
        .flat_map(|sheets| sheets.children_named("sheet"))
        .next()
        .ok_or(ImportError::NoSheets)?;

    RELATIONSHIP_NAMESPACES
        .iter()
        .find_map(|ns| sheet.attr_ns(ns, "id"))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(ImportError::MissingRelationshipId)
}

/// リレーションシップIDに対応する`Target`を取得
pub(crate) fn relationship_target(rels: &XmlElement, rel_id: &str) -> Result<String, ImportError> {
    rels.children_named("Relationship")
        .find(|rel| rel.attr("Id") == Some(rel_id))
        .and_then(|rel| rel.attr("Target"))
        .filter(|target| !target.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ImportError::UnresolvedSheetTarget {
            id: rel_id.to_string(),
        })
}

/// リレーションシップのターゲットをアーカイブ内パスに正規化する
///
/// 先頭の`/`と`../`を取り除き、`xl/`で始まらない場合は付加します。
pub(crate) fn normalize_sheet_target(target: &str) -> String {
    let mut cleaned = target.trim_start_matches('/');
    while let Some(rest) = cleaned.strip_prefix("../") {
        cleaned = rest;
    }
    if cleaned.starts_with("xl/") {
        cleaned.to_string()
    } else {
        format!("xl/{}", cleaned)
    }
}
