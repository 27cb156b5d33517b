//! Error types for the nacre shell library.
//!
//! This module defines a streamlined error hierarchy for the completion
//! engine and its collaborators. No error raised here is fatal to a
//! completion session; callers that want to keep going can always log
//! and continue with an empty candidate list.

use std::{fmt, io};

/// Crate-wide `Result` type using [`NacreError`] as the error.
pub type Result<T> = std::result::Result<T, NacreError>;

/// Top-level error type for nacre operations.
#[derive(Debug)]
pub enum NacreError {
    /// Command-line parsing errors.
    Parse(ParseError),

    /// Wildcard/path expansion errors.
    Expand(ExpandError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a message.
    Generic(String),
}

/// Parsing-specific errors.
#[derive(Debug)]
pub enum ParseError {
    /// Syntax error in input.
    SyntaxError(String),

    /// A quoted region was never closed.
    UnterminatedQuote(char),

    /// Escape sequence at end of input.
    #[allow(dead_code)]
    DanglingEscape,
}

/// Expansion-specific errors.
#[derive(Debug)]
pub enum ExpandError {
    /// A wildcard pattern could not be compiled.
    BadPattern(String),

    /// Directory traversal failed.
    ReadDir(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid config format.
    InvalidFormat(String),

    /// A value was outside its permitted range.
    OutOfRange(String),

    /// Generic configuration error.
    Generic(String),
}

// ============================================================================
// Display implementations
// ============================================================================

impl fmt::Display for NacreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NacreError::Parse(e) => write!(f, "ParseError: {}", e),
            NacreError::Expand(e) => write!(f, "ExpandError: {}", e),
            NacreError::Config(e) => write!(f, "ConfigError: {}", e),
            NacreError::Io(e) => write!(f, "IoError: {}", e),
            NacreError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::SyntaxError(msg) => write!(f, "{}", msg),
            ParseError::UnterminatedQuote(q) => write!(f, "Unterminated {} quote", q),
            ParseError::DanglingEscape => write!(f, "Escape character at end of input"),
        }
    }
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandError::BadPattern(msg) => write!(f, "{}", msg),
            ExpandError::ReadDir(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFormat(msg) => write!(f, "{}", msg),
            ConfigError::OutOfRange(msg) => write!(f, "{}", msg),
            ConfigError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

// ============================================================================
// Error trait implementations
// ============================================================================

impl std::error::Error for NacreError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExpandError {}
impl std::error::Error for ConfigError {}

// ============================================================================
// Conversions to NacreError
// ============================================================================

impl From<ParseError> for NacreError {
    fn from(err: ParseError) -> Self {
        NacreError::Parse(err)
    }
}

impl From<ExpandError> for NacreError {
    fn from(err: ExpandError) -> Self {
        NacreError::Expand(err)
    }
}

impl From<ConfigError> for NacreError {
    fn from(err: ConfigError) -> Self {
        NacreError::Config(err)
    }
}

impl From<io::Error> for NacreError {
    fn from(err: io::Error) -> Self {
        NacreError::Io(err)
    }
}

impl From<String> for NacreError {
    fn from(msg: String) -> Self {
        NacreError::Generic(msg)
    }
}

impl From<&str> for NacreError {
    fn from(msg: &str) -> Self {
        NacreError::Generic(msg.to_string())
    }
}
