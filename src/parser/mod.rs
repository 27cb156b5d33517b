//! Command-line parsing for completion
//!
//! An error-tolerant tokenizer plus the statement-level views the
//! completion driver needs: command-substitution extents, the token
//! under the cursor, and plain-statement extraction.

pub mod statement;
pub mod tokenizer;

pub use statement::{cmdsubst_extent, plain_statement_at, token_extent, Decoration, PlainStatement};
pub use tokenizer::{Token, TokenKind, Tokenizer};
