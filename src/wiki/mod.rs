//! Documentation Output
//!
//! Generated text per item is handed to a [`DocSink`].

pub mod sink;

pub use sink::{DocSink, MarkdownSink};
