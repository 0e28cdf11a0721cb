//! The handler trait the tokenizer drives

use std::collections::HashMap;

/// Receives structural events during a parse.
///
/// `start_document` is called exactly once before any other event and
/// `end_document` exactly once after all others (on a failed strict
/// parse, `end_document` never arrives and the events delivered so far
/// are an unusable partial result).
pub trait MarkupHandler {
    /// Called once, before any other event.
    fn start_document(&mut self);

    /// An element opened. Attribute keys are unique (last duplicate
    /// wins); the map may be empty. The map is reused by the tokenizer,
    /// so implementations must copy what they keep.
    fn start_element(&mut self, name: &str, attributes: &HashMap<String, String>);

    /// Text content: never empty, whitespace already normalized for the
    /// parse mode, entities already decoded.
    fn text(&mut self, content: &str);

    /// An element closed. In strict mode the name matches the most
    /// recently opened unclosed element; in HTML mode it is whatever the
    /// close tag said.
    fn end_element(&mut self, name: &str);

    /// Called once, as the last event.
    fn end_document(&mut self);

    /// A comment body (between `<!--` and `-->`). Comments are optional
    /// output: the default implementation discards them without
    /// buffering.
    fn comment(&mut self, _content: &str) {}
}
