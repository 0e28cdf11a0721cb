//! Streaming markup tokenizer
//!
//! A single-pass, character-driven state machine that tokenizes XML or
//! HTML-like markup directly from a decoded character stream, without
//! building a tree, and pushes structural events to a `MarkupHandler`.
//!
//! Two modes share one machine:
//! - strict (XML): balanced tags enforced, attribute values must be
//!   quoted, case preserved, parsing stops when the root element closes
//! - HTML: tag names and attribute keys lower-cased, unquoted values and
//!   missing `=` tolerated, whitespace runs collapsed to one space, parse
//!   runs to end of stream regardless of balance
//!
//! Nested constructs (entity inside an attribute value, attribute value
//! inside a tag) are handled with an explicit state stack plus a single
//! character of pushback, never recursion.

use std::collections::HashMap;

use log::debug;

use crate::core::entities::decode_entity;
use crate::core::newline::{HtmlNewLine, NeverNewLine, NewLinePolicy};
use crate::core::state::{ParseState, StateStack};
use crate::error::{Error, Result};
use crate::sax::MarkupHandler;

/// Longest entity body accumulated before the reference is abandoned and
/// re-emitted literally. Guards against an unterminated `&` consuming
/// unbounded memory.
const MAX_ENTITY_LEN: usize = 7;

/// Sentinel quote character for HTML unquoted attribute values.
const UNQUOTED: char = ' ';

enum Flow {
    Continue,
    Done,
}

/// The tokenizer state machine.
///
/// One instance owns all parse state and serves exactly one parse; it is
/// consumed by [`Tokenizer::parse`]. Independent parses on separate
/// threads each need their own instance.
pub struct Tokenizer {
    html: bool,
    policy: Box<dyn NewLinePolicy>,

    state: ParseState,
    stack: StateStack,

    // Accumulators
    text: String,
    entity: String,
    tag: Option<String>,
    attributes: HashMap<String, String>,
    attribute_key: Option<String>,
    quote_char: char,

    // One character of pushback
    previous: Option<char>,

    /// False when the most recently emitted character was whitespace.
    nowhite: bool,
    /// A `\r` was just consumed; a following `\n` belongs to it.
    eol: bool,
    nested: i32,
    lines: usize,
    columns: usize,
}

impl Tokenizer {
    /// Create a tokenizer for the given mode with the mode's default
    /// new-line policy.
    pub fn new(html: bool) -> Self {
        let policy: Box<dyn NewLinePolicy> = if html {
            Box::new(HtmlNewLine)
        } else {
            Box::new(NeverNewLine)
        };
        Self::with_policy(html, policy)
    }

    /// Create a tokenizer with an explicit new-line policy.
    pub fn with_policy(html: bool, policy: Box<dyn NewLinePolicy>) -> Self {
        Tokenizer {
            html,
            policy,
            state: if html {
                ParseState::Text
            } else {
                ParseState::Unknown
            },
            stack: StateStack::new(),
            text: String::new(),
            entity: String::new(),
            tag: None,
            attributes: HashMap::new(),
            attribute_key: None,
            quote_char: UNQUOTED,
            previous: None,
            nowhite: false,
            eol: false,
            nested: 0,
            lines: 1,
            columns: 0,
        }
    }

    /// Run the parse to completion, pushing events into `handler`.
    ///
    /// Consumes the tokenizer: all accumulators live for exactly one
    /// parse. In strict mode the source is not drained past the close of
    /// the root element, so trailing data after an embedded fragment is
    /// left for the caller.
    pub fn parse<I, H>(mut self, source: I, handler: &mut H) -> Result<()>
    where
        I: IntoIterator<Item = char>,
        H: MarkupHandler + ?Sized,
    {
        debug!("starting {} parse", if self.html { "html" } else { "strict" });
        let mut source = source.into_iter();
        handler.start_document();

        loop {
            let character = match self.previous.take() {
                Some(c) => c,
                None => match self.next_char(&mut source) {
                    Some(c) => c,
                    None => return self.finish(handler),
                },
            };
            if let Flow::Done = self.step(character, handler)? {
                return Ok(());
            }
        }
    }

    /// Pull the next character, normalizing line endings: a lone `\r` or
    /// a `\r\n` pair is delivered as a single `\n` and counted as one
    /// line.
    fn next_char<I: Iterator<Item = char>>(&mut self, source: &mut I) -> Option<char> {
        loop {
            let mut c = source.next()?;
            if c == '\n' && self.eol {
                self.eol = false;
                continue;
            }
            self.eol = false;
            if c == '\r' {
                self.eol = true;
                c = '\n';
            }
            if c == '\n' {
                self.lines += 1;
                self.columns = 0;
            } else {
                self.columns += 1;
            }
            return Some(c);
        }
    }

    fn step<H: MarkupHandler + ?Sized>(&mut self, c: char, handler: &mut H) -> Result<Flow> {
        match self.state {
            ParseState::Unknown => {
                // Pre-content: everything before the first '<' is ignored.
                if c == '<' {
                    self.stack.push(ParseState::Text);
                    self.state = ParseState::TagEncountered;
                }
            }

            ParseState::Text => {
                if c == '<' {
                    self.flush(handler);
                    self.stack.push(ParseState::Text);
                    self.state = ParseState::TagEncountered;
                } else if c == '&' {
                    self.stack.push(ParseState::Text);
                    self.entity.clear();
                    self.state = ParseState::Entity;
                } else if c.is_whitespace() {
                    // Runs collapse to the first whitespace seen; HTML
                    // forces that survivor to a plain space.
                    if self.nowhite {
                        self.text.push(if self.html { ' ' } else { c });
                    }
                    self.nowhite = false;
                } else {
                    self.text.push(c);
                    self.nowhite = true;
                }
            }

            ParseState::TagEncountered => {
                self.init_tag();
                if c == '/' {
                    self.state = ParseState::InCloseTag;
                } else if c == '?' {
                    self.state = ParseState::ProcessingInstruction;
                } else {
                    self.text.push(c);
                    self.state = ParseState::ExaminingTag;
                }
            }

            ParseState::ExaminingTag => {
                if c == '>' {
                    self.finalize_tag();
                    self.process_start(handler);
                    self.init_tag();
                    self.state = self.stack.pop();
                } else if c == '/' {
                    self.state = ParseState::SingleTag;
                } else if c == '-' && self.text == "!-" {
                    self.flush(handler);
                    self.state = ParseState::Comment;
                } else if c == '[' && self.text == "![CDATA" {
                    self.flush(handler);
                    self.state = ParseState::CData;
                } else if c == 'E' && self.text == "!DOCTYP" {
                    self.flush(handler);
                    self.state = ParseState::ProcessingInstruction;
                } else if c.is_whitespace() {
                    self.finalize_tag();
                    self.state = ParseState::TagExamined;
                } else {
                    self.text.push(c);
                }
            }

            ParseState::TagExamined => {
                if c == '>' {
                    self.process_start(handler);
                    self.init_tag();
                    self.state = self.stack.pop();
                } else if c == '/' {
                    self.state = ParseState::SingleTag;
                } else if c.is_whitespace() {
                    // skip
                } else {
                    self.text.push(c);
                    self.state = ParseState::AttributeKey;
                }
            }

            ParseState::InCloseTag => {
                if c == '>' {
                    self.finalize_tag();
                    self.process_end(handler);
                    if !self.html && self.nested == 0 {
                        // Root closed: stop here and leave any trailing
                        // input unconsumed.
                        handler.end_document();
                        return Ok(Flow::Done);
                    }
                    self.state = self.stack.pop();
                } else if !c.is_whitespace() {
                    self.text.push(c);
                }
            }

            ParseState::SingleTag => {
                if c != '>' {
                    let tag = self
                        .tag
                        .clone()
                        .unwrap_or_else(|| self.text.clone());
                    return Err(Error::ExpectedGtForTag {
                        tag,
                        line: self.lines,
                        column: self.columns,
                    });
                }
                self.finalize_tag();
                self.process_start(handler);
                self.process_end(handler);
                self.init_tag();
                if !self.html && self.nested == 0 {
                    handler.end_document();
                    return Ok(Flow::Done);
                }
                self.state = self.stack.pop();
            }

            ParseState::CData => {
                if c == '>' && self.text.ends_with("]]") {
                    self.text.truncate(self.text.len() - 2);
                    self.flush(handler);
                    self.state = self.stack.pop();
                } else {
                    self.text.push(c);
                }
            }

            ParseState::Comment => {
                if c == '>' && self.text.ends_with("--") {
                    self.text.truncate(self.text.len() - 2);
                    self.flush(handler);
                    self.state = self.stack.pop();
                } else {
                    self.text.push(c);
                }
            }

            ParseState::ProcessingInstruction => {
                if c == '>' {
                    self.state = self.stack.pop();
                    // Re-arm the pre-content search: a declaration or
                    // doctype before the root tag must stay transparent.
                    if self.state == ParseState::Text {
                        self.state = ParseState::Unknown;
                    }
                }
            }

            ParseState::Entity => {
                if c == ';' {
                    self.state = self.stack.pop();
                    let body = std::mem::take(&mut self.entity);
                    match decode_entity(&body) {
                        Some(decoded) => self.text.push(decoded),
                        None => {
                            // Unknown entities degrade to literal text.
                            self.text.push('&');
                            self.text.push_str(&body);
                            self.text.push(';');
                        }
                    }
                    self.nowhite = true;
                } else if (c != '#' && !c.is_ascii_alphanumeric())
                    || self.entity.len() >= MAX_ENTITY_LEN
                {
                    // Not an entity after all: emit what was read and
                    // reprocess the terminator in the enclosing state.
                    self.state = self.stack.pop();
                    self.previous = Some(c);
                    self.text.push('&');
                    self.text.push_str(&self.entity);
                    self.entity.clear();
                    self.nowhite = true;
                } else {
                    self.entity.push(c);
                }
            }

            ParseState::Quote => {
                if self.html && self.quote_char == UNQUOTED && c == '>' {
                    self.flush(handler);
                    self.process_start(handler);
                    self.init_tag();
                    self.state = self.stack.pop();
                } else if self.html && self.quote_char == UNQUOTED && c.is_whitespace() {
                    self.flush(handler);
                    self.state = ParseState::TagExamined;
                } else if self.html && self.quote_char == UNQUOTED {
                    self.text.push(c);
                } else if c == self.quote_char {
                    self.flush(handler);
                    self.state = ParseState::TagExamined;
                } else if matches!(c, ' ' | '\r' | '\n' | '\t') {
                    self.text.push(' ');
                } else if c == '&' {
                    self.stack.push(ParseState::Quote);
                    self.entity.clear();
                    self.state = ParseState::Entity;
                } else {
                    self.text.push(c);
                }
            }

            ParseState::AttributeKey => {
                if c.is_whitespace() {
                    self.flush(handler);
                    self.state = ParseState::AttributeEqual;
                } else if c == '=' {
                    self.flush(handler);
                    self.state = ParseState::AttributeValue;
                } else if c == '>' {
                    if !self.html {
                        return Err(self.attribute_error());
                    }
                    // Tolerate a dangling key: drop it and emit the
                    // element with what was collected.
                    self.text.clear();
                    self.process_start(handler);
                    self.init_tag();
                    self.state = self.stack.pop();
                } else {
                    self.text.push(c);
                }
            }

            ParseState::AttributeEqual => {
                if c == '=' {
                    self.state = ParseState::AttributeValue;
                } else if c.is_whitespace() {
                    // skip
                } else if self.html && c == '>' {
                    self.text.clear();
                    self.process_start(handler);
                    self.init_tag();
                    self.state = self.stack.pop();
                } else if self.html && c == '/' {
                    self.flush(handler);
                    self.state = ParseState::SingleTag;
                } else if self.html {
                    // Missing '=': the token starts a new attribute key
                    // and the pending key is dropped valueless.
                    self.flush(handler);
                    self.text.push(c);
                    self.state = ParseState::AttributeKey;
                } else {
                    return Err(self.attribute_error());
                }
            }

            ParseState::AttributeValue => {
                if c == '"' || c == '\'' {
                    self.quote_char = c;
                    self.state = ParseState::Quote;
                } else if c.is_whitespace() {
                    // skip
                } else if self.html && c == '>' {
                    self.flush(handler);
                    self.process_start(handler);
                    self.init_tag();
                    self.state = self.stack.pop();
                } else if self.html {
                    self.quote_char = UNQUOTED;
                    self.text.push(c);
                    self.state = ParseState::Quote;
                } else {
                    return Err(self.attribute_error());
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// End-of-input: HTML flushes pending text and completes; strict mode
    /// reaching EOF means the root element never closed.
    fn finish<H: MarkupHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        if self.html {
            if self.state == ParseState::Text {
                self.flush(handler);
            }
            handler.end_document();
            Ok(())
        } else {
            Err(Error::UnexpectedEndOfInput {
                line: self.lines,
                column: self.columns,
            })
        }
    }

    /// Route the text buffer to wherever the current state directs, then
    /// clear it.
    fn flush<H: MarkupHandler + ?Sized>(&mut self, handler: &mut H) {
        match self.state {
            ParseState::Text | ParseState::CData => {
                if !self.text.is_empty() {
                    handler.text(&self.text);
                }
            }
            ParseState::Comment => {
                handler.comment(&self.text);
            }
            ParseState::AttributeKey => {
                let mut key = std::mem::take(&mut self.text);
                if self.html {
                    key.make_ascii_lowercase();
                }
                self.attribute_key = Some(key);
            }
            ParseState::Quote | ParseState::AttributeValue => {
                let value = std::mem::take(&mut self.text);
                let key = self.attribute_key.take().unwrap_or_default();
                // Last write wins on duplicate attribute names.
                let _ = self.attributes.insert(key, value);
            }
            _ => {}
        }
        self.text.clear();
    }

    /// Fix the tag name from the text buffer if not already fixed.
    fn finalize_tag(&mut self) {
        if self.tag.is_none() {
            self.tag = Some(std::mem::take(&mut self.text));
        } else {
            self.text.clear();
        }
        if self.html {
            if let Some(tag) = self.tag.as_mut() {
                tag.make_ascii_lowercase();
            }
        }
    }

    fn init_tag(&mut self) {
        self.tag = None;
        self.attributes.clear();
        self.attribute_key = None;
    }

    fn process_start<H: MarkupHandler + ?Sized>(&mut self, handler: &mut H) {
        let tag = self.tag.clone().unwrap_or_default();
        self.nested += 1;
        handler.start_element(&tag, &self.attributes);
    }

    fn process_end<H: MarkupHandler + ?Sized>(&mut self, handler: &mut H) {
        let tag = self.tag.clone().unwrap_or_default();
        self.nested -= 1;
        handler.end_element(&tag);
        if self.policy.is_new_line_tag(&tag) {
            self.nowhite = false;
        }
    }

    fn attribute_error(&self) -> Error {
        Error::AttributeSyntax {
            line: self.lines,
            column: self.columns,
        }
    }
}
