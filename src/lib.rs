//! saxmark - streaming SAX-style markup tokenizer for XML and HTML
//!
//! A hand-written, single-pass, character-driven state machine that
//! tokenizes XML or HTML-like markup directly from a byte or character
//! stream, without building a DOM, and pushes structural events to a
//! caller-supplied [`MarkupHandler`].
//!
//! Entry points by input form:
//! - `parse_str` / `parse_html_str`: already-decoded text
//! - `parse_bytes` / `parse_html_bytes`: raw bytes through the encoding
//!   detector (byte-signature sniffing plus declared-encoding override)
//! - `parse_reader` / `parse_html_reader`: any `std::io::Read`
//!
//! Strict (XML) parsing enforces well-formedness and stops at the close
//! of the root element; HTML parsing tolerates real-world malformed
//! markup and runs to end of input. [`escape_markup`] is the inverse of
//! the tokenizer's entity decoding.
//!
//! ```
//! use saxmark::{parse_str, EventCollector};
//!
//! let mut collector = EventCollector::new();
//! parse_str(&mut collector, "<greeting kind=\"curt\">hi</greeting>").unwrap();
//! assert_eq!(collector.events().len(), 5); // start doc/elem, text, end elem/doc
//! ```

mod core;
mod error;
mod sax;

use std::io::Read;

pub use crate::core::encoding::{decode, detect, sniff, Encoding};
pub use crate::core::entities::{decode_entity, escape_markup};
pub use crate::core::newline::{HtmlNewLine, NeverNewLine, NewLinePolicy};
pub use crate::core::state::{ParseState, StateStack};
pub use crate::core::tokenizer::Tokenizer;
pub use crate::error::{Error, Result};
pub use crate::sax::{EventCollector, MarkupEvent, MarkupHandler};

/// Parse decoded text in strict (XML) mode.
pub fn parse_str<H: MarkupHandler + ?Sized>(handler: &mut H, source: &str) -> Result<()> {
    Tokenizer::new(false).parse(source.chars(), handler)
}

/// Parse decoded text in lenient (HTML) mode.
pub fn parse_html_str<H: MarkupHandler + ?Sized>(handler: &mut H, source: &str) -> Result<()> {
    Tokenizer::new(true).parse(source.chars(), handler)
}

/// Parse raw bytes in strict (XML) mode.
///
/// The encoding is sniffed from the first 4 bytes (fewer is a
/// [`Error::TruncatedStream`]) and may be overridden by a declared
/// `encoding="..."` in the prefix before the first `>`.
pub fn parse_bytes<H: MarkupHandler + ?Sized>(handler: &mut H, bytes: &[u8]) -> Result<()> {
    let decoded = decode(bytes)?;
    Tokenizer::new(false).parse(decoded.chars(), handler)
}

/// Parse raw bytes in lenient (HTML) mode.
pub fn parse_html_bytes<H: MarkupHandler + ?Sized>(handler: &mut H, bytes: &[u8]) -> Result<()> {
    let decoded = decode(bytes)?;
    Tokenizer::new(true).parse(decoded.chars(), handler)
}

/// Drain a reader and parse its bytes in strict (XML) mode.
///
/// The reader is only drained, never closed; its lifecycle stays with
/// the caller.
pub fn parse_reader<H: MarkupHandler + ?Sized, R: Read>(
    handler: &mut H,
    mut reader: R,
) -> Result<()> {
    let mut bytes = Vec::new();
    let _ = reader.read_to_end(&mut bytes)?;
    parse_bytes(handler, &bytes)
}

/// Drain a reader and parse its bytes in lenient (HTML) mode.
pub fn parse_html_reader<H: MarkupHandler + ?Sized, R: Read>(
    handler: &mut H,
    mut reader: R,
) -> Result<()> {
    let mut bytes = Vec::new();
    let _ = reader.read_to_end(&mut bytes)?;
    parse_html_bytes(handler, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bytes_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for b in b"<r>ok</r>" {
            bytes.push(*b);
            bytes.push(0x00);
        }
        let mut collector = EventCollector::new();
        parse_bytes(&mut collector, &bytes).unwrap();
        assert_eq!(collector.text_content(), "ok");
    }

    #[test]
    fn test_parse_bytes_declared_latin1() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</r>");
        let mut collector = EventCollector::new();
        parse_bytes(&mut collector, &bytes).unwrap();
        assert_eq!(collector.text_content(), "\u{e9}");
    }

    #[test]
    fn test_parse_bytes_truncated() {
        let mut collector = EventCollector::new();
        assert!(matches!(
            parse_bytes(&mut collector, b"<r>"),
            Err(Error::TruncatedStream)
        ));
    }

    #[test]
    fn test_parse_reader() {
        let source = std::io::Cursor::new(b"<root><leaf/></root>".to_vec());
        let mut collector = EventCollector::new();
        parse_reader(&mut collector, source).unwrap();
        assert_eq!(collector.events().len(), 6);
    }

    #[test]
    fn test_parse_html_str_is_lenient() {
        let mut collector = EventCollector::new();
        parse_html_str(&mut collector, "<P CLASS=Intro>Hello").unwrap();
        assert_eq!(
            collector.events()[1],
            MarkupEvent::StartElement {
                name: "p".to_string(),
                attributes: [("class".to_string(), "Intro".to_string())].into(),
            }
        );
    }
}
