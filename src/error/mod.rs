pub mod kinds;

// Re-export commonly used error types and the crate-wide Result alias
pub use kinds::{ConfigError, ExpandError, NacreError, ParseError, Result};
