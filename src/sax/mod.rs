//! SAX-style event surface
//!
//! The tokenizer pushes structural events into a [`MarkupHandler`] as it
//! scans; nothing is buffered beyond the current token. Consumers that
//! want the whole stream at once (tests, batch conversion) can use the
//! [`EventCollector`], which records owned [`MarkupEvent`]s.

pub mod collector;
pub mod events;
pub mod handler;

pub use collector::EventCollector;
pub use events::MarkupEvent;
pub use handler::MarkupHandler;
