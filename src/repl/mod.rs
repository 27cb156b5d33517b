//! Line-editor integration
//!
//! Adapters that plug the completion engine into an interactive
//! front-end.

pub mod completer;

pub use completer::NacreCompleter;
