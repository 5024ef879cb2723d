//! XML-to-structure parser for carrier CDR payloads
//!
//! Thin adapter over the usual XML-to-mapping convention: element and
//! attribute names become keys, text content becomes values, and repeated
//! sibling elements collapse into an ordered sequence preserving document
//! order. No semantic validation of CDR field names happens here.

use chibi_core::{AppError, AppResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// A parsed XML value
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// Leaf text content
    Text(String),
    /// Element with attributes and/or child elements
    Map(HashMap<String, XmlValue>),
    /// Repeated sibling elements, in document order
    List(Vec<XmlValue>),
}

impl XmlValue {
    /// Look up a child by element or attribute name
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Text content, if this is a leaf
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Child text content under `key`
    pub fn text_of(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(XmlValue::as_text)
    }

    /// View this value as a sequence of entries
    ///
    /// A `List` yields its items; any other value yields itself as a
    /// one-element sequence. This smooths over the single-entry batch case
    /// where no sibling repetition occurred.
    pub fn entries(&self) -> Vec<&XmlValue> {
        match self {
            XmlValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

/// One open element during parsing
struct Frame {
    name: String,
    children: HashMap<String, XmlValue>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: HashMap::new(),
            text: String::new(),
        }
    }

    fn finish(self) -> (String, XmlValue) {
        let value = if self.children.is_empty() {
            XmlValue::Text(self.text.trim().to_string())
        } else {
            XmlValue::Map(self.children)
        };
        (self.name, value)
    }
}

/// Insert a child, collapsing repeated keys into an ordered list
fn insert_child(map: &mut HashMap<String, XmlValue>, key: String, value: XmlValue) {
    match map.get_mut(&key) {
        Some(XmlValue::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, XmlValue::List(Vec::new()));
            if let XmlValue::List(items) = existing {
                items.push(first);
                items.push(value);
            }
        }
        None => {
            map.insert(key, value);
        }
    }
}

/// Parse a well-formed XML document into an [`XmlValue`] mapping
///
/// The returned value is the map of the document's root-level elements.
///
/// # Errors
///
/// Returns `AppError::XmlParse` for malformed input, including truncated
/// documents and mismatched end tags.
pub fn parse(input: &str) -> AppResult<XmlValue> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<Frame> = vec![Frame::new(String::new())];

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut frame = Frame::new(name);

                for attr in start.attributes() {
                    let attr =
                        attr.map_err(|e| AppError::XmlParse(format!("Bad attribute: {}", e)))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| AppError::XmlParse(format!("Bad attribute value: {}", e)))?
                        .into_owned();
                    insert_child(&mut frame.children, key, XmlValue::Text(value));
                }

                stack.push(frame);
            }
            Ok(Event::Empty(empty)) => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                let mut children = HashMap::new();

                for attr in empty.attributes() {
                    let attr =
                        attr.map_err(|e| AppError::XmlParse(format!("Bad attribute: {}", e)))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| AppError::XmlParse(format!("Bad attribute value: {}", e)))?
                        .into_owned();
                    insert_child(&mut children, key, XmlValue::Text(value));
                }

                let value = if children.is_empty() {
                    XmlValue::Text(String::new())
                } else {
                    XmlValue::Map(children)
                };

                let parent = stack.last_mut().expect("root frame always present");
                insert_child(&mut parent.children, name, value);
            }
            Ok(Event::Text(text)) => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| AppError::XmlParse(format!("Bad text content: {}", e)))?;
                let frame = stack.last_mut().expect("root frame always present");
                frame.text.push_str(&unescaped);
            }
            Ok(Event::CData(cdata)) => {
                let frame = stack.last_mut().expect("root frame always present");
                frame
                    .text
                    .push_str(&String::from_utf8_lossy(&cdata.into_inner()));
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(AppError::XmlParse("Unexpected closing tag".to_string()));
                }
                let (name, value) = stack.pop().expect("length checked above").finish();
                let parent = stack.last_mut().expect("root frame always present");
                insert_child(&mut parent.children, name, value);
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctypes
            Ok(_) => {}
            Err(e) => return Err(AppError::XmlParse(e.to_string())),
        }
    }

    if stack.len() != 1 {
        return Err(AppError::XmlParse(
            "Unexpected end of document".to_string(),
        ));
    }

    let (_, value) = stack.pop().expect("root frame always present").finish();
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let doc = r#"<?xml version="1.0"?>
            <cdr>
                <uuid>CA1234</uuid>
                <duration>42</duration>
            </cdr>"#;

        let value = parse(doc).unwrap();
        let cdr = value.get("cdr").unwrap();
        assert_eq!(cdr.text_of("uuid"), Some("CA1234"));
        assert_eq!(cdr.text_of("duration"), Some("42"));
    }

    #[test]
    fn test_repeated_siblings_collapse_into_ordered_list() {
        let doc = r#"
            <cdrs>
                <cdr><uuid>CA0001</uuid></cdr>
                <cdr><uuid>CA0002</uuid></cdr>
            </cdrs>"#;

        let value = parse(doc).unwrap();
        let cdrs = value.get("cdrs").unwrap();

        match cdrs.get("cdr").unwrap() {
            XmlValue::List(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].text_of("uuid"), Some("CA0001"));
                assert_eq!(items[1].text_of("uuid"), Some("CA0002"));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_attributes_become_keys() {
        let doc = r#"<receipt sid="SM1" status="delivered"/>"#;

        let value = parse(doc).unwrap();
        let receipt = value.get("receipt").unwrap();
        assert_eq!(receipt.text_of("sid"), Some("SM1"));
        assert_eq!(receipt.text_of("status"), Some("delivered"));
    }

    #[test]
    fn test_entries_wraps_single_element() {
        let doc = "<cdrs><cdr><uuid>CA0001</uuid></cdr></cdrs>";

        let value = parse(doc).unwrap();
        let entries = value.get("cdrs").unwrap().get("cdr").unwrap().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text_of("uuid"), Some("CA0001"));
    }

    #[test]
    fn test_truncated_document_fails() {
        let err = parse("<cdrs><cdr><uuid>CA0001").unwrap_err();
        assert!(matches!(err, AppError::XmlParse(_)));
    }

    #[test]
    fn test_mismatched_end_tag_fails() {
        let err = parse("<cdrs><cdr></cdrs></cdr>").unwrap_err();
        assert!(matches!(err, AppError::XmlParse(_)));
    }

    #[test]
    fn test_stray_closing_tag_fails() {
        let err = parse("</cdr>").unwrap_err();
        assert!(matches!(err, AppError::XmlParse(_)));
    }
}
