//! XML Element Tree Module
//!
//! quick-xmlのイベントを小さな要素ツリーに組み立てるモジュール。
//! 要素名はローカル名で照合し、属性は名前空間URIとローカル名の組で保持します。

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::error::ImportError;

/// 属性（名前空間付き）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlAttribute {
    /// 名前空間URI（接頭辞なしの属性は`None`）
    pub namespace: Option<String>,
    /// ローカル名
    pub name: String,
    /// エスケープ解除済みの値
    pub value: String,
}

/// XML要素
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlElement {
    /// ローカル名
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlElement>,
    /// 直下のテキストノードを連結した内容
    pub text: String,
}

impl XmlElement {
    /// XMLドキュメントを解析し、ルート要素を返す
    ///
    /// # 引数
    ///
    /// * `part` - エラーメッセージに使用するパート名
    /// * `xml` - XMLドキュメントのバイト列
    pub fn parse(part: &str, xml: &[u8]) -> Result<Self, ImportError> {
        let mut reader = NsReader::from_reader(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| ImportError::malformed_xml(part, e))?;

            match event {
                Event::Start(e) => {
                    let element = open_element(&reader, &e, part)?;
                    stack.push(element);
                }
                Event::Empty(e) => {
                    let element = open_element(&reader, &e, part)?;
                    attach(&mut stack, &mut root, element, part)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ImportError::malformed_xml(part, "unbalanced end tag"))?;
                    attach(&mut stack, &mut root, element, part)?;
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last_mut() {
                        let text = e.unescape().map_err(|e| ImportError::malformed_xml(part, e))?;
                        current.text.push_str(&text);
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ImportError::malformed_xml(part, "unexpected end of document"));
        }
        root.ok_or_else(|| ImportError::malformed_xml(part, "missing root element"))
    }

    /// 名前空間なしの属性値を取得
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// 指定した名前空間の属性値を取得
    pub fn attr_ns(&self, namespace: &str, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.as_deref() == Some(namespace) && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// 指定したローカル名の最初の子要素
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// 指定したローカル名の子要素（文書順）
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// 子孫要素のうち`name`に一致するもののテキストを文書順に連結する
    pub fn descendant_text(&self, name: &str) -> String {
        let mut out = String::new();
        self.collect_text(name, &mut out);
        out
    }

    fn collect_text(&self, name: &str, out: &mut String) {
        for child in &self.children {
            if child.name == name {
                out.push_str(&child.text);
            } else {
                child.collect_text(name, out);
            }
        }
    }
}

fn owned_namespace(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    }
}

fn open_element<R>(
    reader: &NsReader<R>,
    start: &BytesStart<'_>,
    part: &str,
) -> Result<XmlElement, ImportError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ImportError::malformed_xml(part, e))?;
        let key = attr.key.as_ref();
        // 名前空間宣言は属性として保持しない
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }

        let (resolved, local) = reader.resolve_attribute(attr.key);
        let value = attr
            .unescape_value()
            .map_err(|e| ImportError::malformed_xml(part, e))?
            .into_owned();
        attributes.push(XmlAttribute {
            namespace: owned_namespace(resolved),
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value,
        });
    }

    Ok(XmlElement {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    part: &str,
) -> Result<(), ImportError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ImportError::malformed_xml(part, "multiple root elements")),
    }
    Ok(())
}
