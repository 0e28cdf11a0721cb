//! Tokenizer states and the resume stack
//!
//! The tokenizer is an explicit finite-state machine: one `ParseState` is
//! active at a time, and nested constructs (an entity inside an attribute
//! value, an attribute value inside a tag) save the enclosing state on a
//! plain LIFO stack instead of recursing.

/// Current tokenizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Pre-content state: ignore everything until the first `<`.
    Unknown,
    /// Accumulating text content between tags.
    Text,
    /// Just saw `<`; the next character decides the construct.
    TagEncountered,
    /// Accumulating a tag or special-construct name.
    ExaminingTag,
    /// Tag name finalized; looking for attributes or `>`.
    TagExamined,
    /// Inside `</...>`.
    InCloseTag,
    /// Saw `/` inside a tag; expecting `>`.
    SingleTag,
    /// Inside a `<![CDATA[...]]>` section.
    CData,
    /// Inside a `<!--...-->` comment.
    Comment,
    /// Inside `<?...?>` or a DOCTYPE; skipping until `>`.
    ProcessingInstruction,
    /// Accumulating an entity body between `&` and `;`.
    Entity,
    /// Inside an attribute value (quoted, or space-terminated in HTML).
    Quote,
    /// Accumulating an attribute name.
    AttributeKey,
    /// Between an attribute name and its `=`.
    AttributeEqual,
    /// After `=`, waiting for the opening quote.
    AttributeValue,
}

/// LIFO stack of saved states used to resume an enclosing context.
///
/// Popping an empty stack yields `Unknown` rather than failing: a
/// sub-context that never properly closes must not crash the parser.
#[derive(Debug, Default)]
pub struct StateStack {
    states: Vec<ParseState>,
}

impl StateStack {
    pub fn new() -> Self {
        StateStack { states: Vec::new() }
    }

    /// Save a state to resume later.
    #[inline]
    pub fn push(&mut self, state: ParseState) {
        self.states.push(state);
    }

    /// Restore the most recently saved state, or `Unknown` if none remains.
    #[inline]
    pub fn pop(&mut self) -> ParseState {
        self.states.pop().unwrap_or(ParseState::Unknown)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
