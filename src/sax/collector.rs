//! Event collector
//!
//! A `MarkupHandler` that records the full event stream as owned
//! [`MarkupEvent`]s, comments included. Used by the crate's own tests
//! and by embedders that want batch output instead of callbacks.

use std::collections::HashMap;

use super::events::MarkupEvent;
use super::handler::MarkupHandler;

/// Collects every event of a parse in order.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<MarkupEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        EventCollector { events: Vec::new() }
    }

    /// The events recorded so far.
    pub fn events(&self) -> &[MarkupEvent] {
        &self.events
    }

    /// Take the recorded events, leaving the collector empty.
    pub fn take_events(&mut self) -> Vec<MarkupEvent> {
        std::mem::take(&mut self.events)
    }

    /// Concatenation of all text events.
    pub fn text_content(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                MarkupEvent::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl MarkupHandler for EventCollector {
    fn start_document(&mut self) {
        self.events.push(MarkupEvent::StartDocument);
    }

    fn start_element(&mut self, name: &str, attributes: &HashMap<String, String>) {
        self.events.push(MarkupEvent::StartElement {
            name: name.to_string(),
            attributes: attributes.clone(),
        });
    }

    fn text(&mut self, content: &str) {
        self.events.push(MarkupEvent::Text(content.to_string()));
    }

    fn end_element(&mut self, name: &str) {
        self.events.push(MarkupEvent::EndElement(name.to_string()));
    }

    fn end_document(&mut self) {
        self.events.push(MarkupEvent::EndDocument);
    }

    fn comment(&mut self, content: &str) {
        self.events.push(MarkupEvent::Comment(content.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut collector = EventCollector::new();
        collector.start_document();
        collector.text("a");
        collector.comment("c");
        collector.end_document();
        assert_eq!(
            collector.take_events(),
            vec![
                MarkupEvent::StartDocument,
                MarkupEvent::Text("a".to_string()),
                MarkupEvent::Comment("c".to_string()),
                MarkupEvent::EndDocument,
            ]
        );
        assert!(collector.events().is_empty());
    }

    #[test]
    fn test_text_content() {
        let mut collector = EventCollector::new();
        collector.text("a");
        collector.text("b");
        assert_eq!(collector.text_content(), "ab");
    }
}
