//! Completion candidates and their presentation flags

use bitflags::bitflags;

use super::fuzzy::FuzzyMatch;

bitflags! {
    /// Presentation flags attached to a completion candidate
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompleteFlags: u8 {
        /// The candidate replaces the whole token instead of being
        /// appended to it
        const REPLACES_TOKEN = 1 << 0;
        /// Do not add a trailing space when the candidate is accepted
        const NO_SPACE = 1 << 1;
        /// Resolved at construction: becomes NO_SPACE iff the candidate
        /// ends in one of `/ = @ :`, otherwise cleared
        const AUTO_SPACE = 1 << 2;
        /// The candidate text is already shell-escaped
        const DONT_ESCAPE = 1 << 3;
        /// Preserve insertion order when the caller sorts
        const DONT_SORT = 1 << 4;
    }
}

/// A single completion candidate.
///
/// `text` is what gets inserted (or, with [`CompleteFlags::REPLACES_TOKEN`],
/// what the token becomes); `description` is a short human-readable label
/// and may be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// The string to insert or propose
    pub text: String,
    /// Short human-readable label (may be empty)
    pub description: String,
    /// How this candidate matched the query
    pub match_kind: FuzzyMatch,
    /// Presentation flags; AUTO_SPACE is resolved in the constructor
    /// and never observable here
    pub flags: CompleteFlags,
}

impl Completion {
    /// Create a new candidate, resolving AUTO_SPACE against the text
    pub fn new(
        text: impl Into<String>,
        description: impl Into<String>,
        match_kind: FuzzyMatch,
        flags: CompleteFlags,
    ) -> Self {
        let text = text.into();
        let flags = resolve_auto_space(&text, flags);
        Self {
            text,
            description: description.into(),
            match_kind,
            flags,
        }
    }

    /// Alphabetical comparison on the completion text
    pub fn is_alphabetically_less_than(a: &Completion, b: &Completion) -> bool {
        a.text < b.text
    }

    /// Alphabetical equality on the completion text
    pub fn is_alphabetically_equal_to(a: &Completion, b: &Completion) -> bool {
        a.text == b.text
    }
}

/// Clear AUTO_SPACE, setting NO_SPACE iff the text ends in a character
/// that wants more input after it
fn resolve_auto_space(text: &str, mut flags: CompleteFlags) -> CompleteFlags {
    if flags.contains(CompleteFlags::AUTO_SPACE) {
        flags.remove(CompleteFlags::AUTO_SPACE);
        if let Some(last) = text.chars().last() {
            if matches!(last, '/' | '=' | '@' | ':') {
                flags.insert(CompleteFlags::NO_SPACE);
            }
        }
    }
    flags
}

/// Append a candidate to a completion list
pub fn append_completion(
    completions: &mut Vec<Completion>,
    text: impl Into<String>,
    description: impl Into<String>,
    flags: CompleteFlags,
    match_kind: FuzzyMatch,
) {
    completions.push(Completion::new(text, description, match_kind, flags));
}
