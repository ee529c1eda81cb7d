//! Minimal owned element tree over a quick-xml event stream.
//!
//! The SOAP facade needs ordered, namespace-tolerant traversal of small
//! documents, not a streaming parser. This builds the whole tree up front;
//! envelopes are tiny and the inbound body is already buffered.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ProtocolError;

/// One XML element: prefix-stripped tag, direct text content, children in
/// document order. Attributes are ignored; nothing in the facade reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(tag: String) -> Self {
        Self {
            tag,
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// First direct child whose tag matches exactly.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// First direct child whose tag matches case-insensitively.
    pub fn child_ci(&self, tag: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|c| c.tag.eq_ignore_ascii_case(tag))
    }

    /// First descendant (depth-first, document order, self excluded) whose
    /// tag matches case-insensitively.
    pub fn descendant_ci(&self, tag: &str) -> Option<&Element> {
        for child in &self.children {
            if child.tag.eq_ignore_ascii_case(tag) {
                return Some(child);
            }
            if let Some(found) = child.descendant_ci(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Direct text content, whitespace-trimmed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// Parse a well-formed XML document into its root element.
pub fn parse(bytes: &[u8]) -> Result<Element, ProtocolError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::MalformedXml)?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let tag = local_name(start.name().into_inner());
                stack.push(Element::new(tag));
            }
            Ok(Event::Empty(start)) => {
                let element = Element::new(local_name(start.name().into_inner()));
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => {
                        if root.is_some() {
                            return Err(ProtocolError::MalformedXml);
                        }
                        root = Some(element);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                let unescaped = text.unescape().map_err(|_| ProtocolError::MalformedXml)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(cdata)) => {
                let raw = cdata.into_inner();
                let content =
                    std::str::from_utf8(&raw).map_err(|_| ProtocolError::MalformedXml)?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(content);
                }
            }
            Ok(Event::End(_)) => {
                let element = stack.pop().ok_or(ProtocolError::MalformedXml)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => {
                        if root.is_some() {
                            return Err(ProtocolError::MalformedXml);
                        }
                        root = Some(element);
                    }
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctypes.
            Ok(_) => {}
            Err(_) => return Err(ProtocolError::MalformedXml),
        }
    }

    if !stack.is_empty() {
        return Err(ProtocolError::MalformedXml);
    }
    root.ok_or(ProtocolError::MalformedXml)
}

/// Tag name with any namespace prefix stripped.
fn local_name(qname: &[u8]) -> String {
    let local = match qname.iter().rposition(|&b| b == b':') {
        Some(idx) => &qname[idx + 1..],
        None => qname,
    };
    String::from_utf8_lossy(local).into_owned()
}
