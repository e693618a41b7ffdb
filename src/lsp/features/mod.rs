//! Editor features for scenario files
//!
//! Completion is the only request-driven feature; schema validation is
//! delegated to the client's YAML service through [`crate::lsp::schema`].

pub mod completion;

pub use completion::{CompletionProvider, Trigger, complete};
