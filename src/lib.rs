//! Nacre Shell Library
//!
//! This library provides the core functionality of the nacre shell, a
//! POSIX-like interactive shell. The centerpiece is the command-line
//! completion engine: a declarative store of per-command option schemas,
//! a driver that parses an incomplete command line and decides which
//! completions to generate, and the completers for commands, switches,
//! option arguments, files, environment variables and `~user` expansions.
//!
//! # Modules
//!
//! - `completion`: The completion engine (store, session, matchers, printer)
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `expand`: Wildcard and path expansion
//! - `host`: Trait seams for the shell runtime (environment, subshells, users)
//! - `parser`: Error-tolerant command-line tokenization and statement extraction
//! - `repl`: Line-editor integration
//! - `utils`: Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use nacre::completion::{CompletionEngine, CompletionRequestFlags, ResultMode};
//! use nacre::host::Host;
//! use std::sync::Arc;
//!
//! let engine = CompletionEngine::new(Arc::new(Host::with_defaults()));
//! engine.add("git", false, Some('b'), "branch", false, ResultMode::NO_COMMON,
//!            "", "master develop", "Branch to use");
//!
//! let candidates = engine.complete("git -", CompletionRequestFlags::DESCRIPTIONS);
//! for c in &candidates {
//!     println!("{}\t{}", c.text, c.description);
//! }
//! ```

pub mod completion;
pub mod config;
pub mod error;
pub mod expand;
pub mod host;
pub mod parser;
pub mod repl;
pub mod utils;

// Re-export commonly used types
pub use completion::{
    CompleteFlags, Completion, CompletionEngine, CompletionRequestFlags, ResultMode,
};
pub use config::Config;
pub use error::{NacreError, Result};
pub use expand::{ExpandFlags, Expander};
pub use host::Host;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
