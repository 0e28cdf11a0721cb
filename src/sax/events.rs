//! Owned event records
//!
//! The tokenizer itself only lends borrowed data to the handler; these
//! owned records exist for consumers that keep the stream around.

use std::collections::HashMap;

/// One recorded parsing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    StartDocument,
    StartElement {
        name: String,
        attributes: HashMap<String, String>,
    },
    Text(String),
    EndElement(String),
    Comment(String),
    EndDocument,
}

impl MarkupEvent {
    /// Element name for start and end events.
    pub fn element_name(&self) -> Option<&str> {
        match self {
            MarkupEvent::StartElement { name, .. } => Some(name),
            MarkupEvent::EndElement(name) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, MarkupEvent::Text(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_name() {
        let event = MarkupEvent::EndElement("p".to_string());
        assert_eq!(event.element_name(), Some("p"));
        assert_eq!(MarkupEvent::StartDocument.element_name(), None);
    }
}
