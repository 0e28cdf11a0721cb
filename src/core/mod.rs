//! Core parsing primitives
//!
//! The fundamental building blocks of the streaming parser:
//! - State: the FSM state set and the resume stack
//! - Tokenizer: the character-driven state machine
//! - Entities: predefined/numeric entity decoding and markup escaping
//! - Encoding: byte-signature sniffing and decoding to characters
//! - Newline: the pluggable whitespace policy for HTML vs XML

pub mod encoding;
pub mod entities;
pub mod newline;
pub mod state;
pub mod tokenizer;
