//! XML payload parsing.
//!
//! `INFO CONFIG`, `INFO TEMPLATE`, `INFO PATHS` and `INFO SYSTEM` answer
//! with an XML document spread over the payload lines. The document is read
//! once into an [`Element`] tree, which the typed readers in the submodules
//! then walk.

mod config;
mod info;
mod template;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{AmcpError, AmcpResult};

pub use config::parse_server_config;
pub use info::{parse_server_paths, parse_system_info, parse_template_listing};
pub use template::parse_template;

/// An XML element with its attributes, text and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The element's own text, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// The first direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first direct child with the given name, if that child
    /// exists and has non-blank text.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(Element::text).filter(|t| !t.is_empty())
    }

    /// This element and all of its descendants, level by level.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let next = out[i];
            out.extend(next.children.iter());
            i += 1;
        }
        out
    }

    /// The first descendant (or this element) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.descendants().into_iter().find(|e| e.name == name)
    }
}

/// Joins payload lines and parses them into an element tree.
///
/// # Errors
///
/// Returns `MalformedFrame` for an empty payload, invalid XML, or trailing
/// elements after the root.
pub fn parse_document(lines: &[String]) -> AmcpResult<Element> {
    let xml = lines.join("\n");
    if xml.trim().is_empty() {
        return Err(AmcpError::malformed("empty XML payload"));
    }

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AmcpError::malformed(format!("invalid XML: {e}")))?;

        match event {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(AmcpError::malformed("content after the root element"));
                }
                stack.push(element_from(&e)?);
            }
            Event::Empty(e) => {
                if root.is_some() {
                    return Err(AmcpError::malformed("content after the root element"));
                }
                let element = element_from(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(AmcpError::malformed("unbalanced closing tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| AmcpError::malformed(format!("invalid XML text: {e}")))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(AmcpError::malformed(format!(
            "unexpected end of document inside <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }

    root.ok_or_else(|| AmcpError::malformed("XML payload has no root element"))
}

/// Parses a document and checks the name of its root element.
pub(crate) fn parse_rooted(lines: &[String], root: &str) -> AmcpResult<Element> {
    let document = parse_document(lines)?;
    if document.name != root {
        return Err(AmcpError::malformed(format!(
            "expected <{root}> root element, found <{}>",
            document.name
        )));
    }
    Ok(document)
}

fn element_from(start: &BytesStart<'_>) -> AmcpResult<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));

    for attr in start.attributes() {
        let attr = attr.map_err(|e| AmcpError::malformed(format!("invalid XML attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| AmcpError::malformed(format!("invalid XML attribute value: {e}")))?;
        element.attributes.push((key, value.to_string()));
    }

    Ok(element)
}
