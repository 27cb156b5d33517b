//! Completer for reedline - bridges the engine to a line editor

use std::sync::Arc;

use reedline::{Completer, Span, Suggestion};

use crate::completion::{CompleteFlags, CompletionEngine, CompletionRequestFlags};
use crate::parser::token_extent;

/// Nacre completer for reedline
pub struct NacreCompleter {
    /// Shared completion engine
    engine: Arc<CompletionEngine>,
}

impl NacreCompleter {
    /// Create a new completer around a shared engine
    pub fn new(engine: Arc<CompletionEngine>) -> Self {
        Self { engine }
    }
}

impl Completer for NacreCompleter {
    /// Complete the input at the given cursor position
    ///
    /// # Arguments
    /// * `line` - The input line
    /// * `pos` - Cursor position (byte index)
    ///
    /// # Returns
    /// * `Vec<Suggestion>` - List of completion suggestions
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        // The engine completes at the end of its input
        let slice = &line[..pos.min(line.len())];
        let candidates = self
            .engine
            .complete(slice, CompletionRequestFlags::DESCRIPTIONS);

        // reedline replaces a span; non-replacing candidates append to
        // the token under the cursor
        let token_range = token_extent(slice, slice.len());
        let token = &slice[token_range.clone()];

        candidates
            .into_iter()
            .map(|c| {
                let value = if c.flags.contains(CompleteFlags::REPLACES_TOKEN) {
                    c.text
                } else {
                    format!("{}{}", token, c.text)
                };
                Suggestion {
                    value,
                    description: (!c.description.is_empty()).then_some(c.description),
                    style: None,
                    extra: None,
                    span: Span::new(token_range.start, pos),
                    append_whitespace: !c.flags.contains(CompleteFlags::NO_SPACE),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::ResultMode;
    use crate::host::Host;

    fn create_test_completer() -> NacreCompleter {
        let engine = CompletionEngine::new(Arc::new(Host::with_defaults()));
        engine.add(
            "git",
            false,
            Some('b'),
            "branch",
            false,
            ResultMode::NO_COMMON,
            "",
            "master develop",
            "Branch to use",
        );
        NacreCompleter::new(Arc::new(engine))
    }

    #[test]
    fn test_complete_switch() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("git -", 5);

        assert!(suggestions.iter().any(|s| s.value == "-b"));
    }

    #[test]
    fn test_span_covers_token() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("git -b ma", 9);

        let master = suggestions.iter().find(|s| s.value == "master").unwrap();
        assert_eq!(master.span.start, 7);
        assert_eq!(master.span.end, 9);
    }

    #[test]
    fn test_descriptions_are_forwarded() {
        let mut completer = create_test_completer();
        let suggestions = completer.complete("git -", 5);

        let short = suggestions.iter().find(|s| s.value == "-b").unwrap();
        assert_eq!(short.description.as_deref(), Some("Branch to use"));
    }
}
