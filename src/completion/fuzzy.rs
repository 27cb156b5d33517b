//! Fuzzy match classification
//!
//! Candidates are classified by *how* they match the query: exact,
//! prefix, substring or subsequence, each optionally case-folded. The
//! kind both filters candidates (a session may cap the allowed kind)
//! and tells the front-end how to present them; kinds past prefix
//! require replacing the whole token instead of appending to it.

/// Ranked classifier of how a candidate matches the query.
///
/// Variants are ordered from best to worst; `None` never appears in
/// results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FuzzyMatchKind {
    /// Candidate equals the query
    Exact,
    /// Candidate equals the query ignoring case
    ExactCaseInsensitive,
    /// Query is a prefix of the candidate
    Prefix,
    /// Query is a prefix of the candidate ignoring case
    PrefixCaseInsensitive,
    /// Query occurs somewhere inside the candidate
    Substring,
    /// Query characters occur in order inside the candidate
    Subsequence,
    /// No match
    None,
}

/// Fuzzy match descriptor attached to every completion candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyMatch {
    /// How the candidate matched
    pub kind: FuzzyMatchKind,
    /// Whether the match only holds after case folding
    pub case_fold: bool,
}

impl FuzzyMatch {
    /// The default descriptor for candidates constructed directly
    pub fn exact() -> Self {
        Self {
            kind: FuzzyMatchKind::Exact,
            case_fold: false,
        }
    }

    /// Check for the absence of a match
    pub fn is_none(&self) -> bool {
        self.kind == FuzzyMatchKind::None
    }

    /// Whether accepting this candidate must replace the whole token.
    ///
    /// Anything beyond a case-sensitive prefix cannot be expressed by
    /// appending characters to what the user already typed.
    pub fn requires_full_replacement(&self) -> bool {
        !matches!(self.kind, FuzzyMatchKind::Exact | FuzzyMatchKind::Prefix)
    }
}

impl Default for FuzzyMatch {
    fn default() -> Self {
        Self::exact()
    }
}

/// Classify how `candidate` matches `query`, capped at `limit`.
///
/// Returns the best applicable kind; kinds ranked worse than `limit`
/// are reported as `None`.
pub fn fuzzy_match(query: &str, candidate: &str, limit: FuzzyMatchKind) -> FuzzyMatch {
    let found = classify(query, candidate);
    if found.kind > limit {
        return FuzzyMatch {
            kind: FuzzyMatchKind::None,
            case_fold: false,
        };
    }
    found
}

fn classify(query: &str, candidate: &str) -> FuzzyMatch {
    use FuzzyMatchKind::*;

    if query == candidate {
        return FuzzyMatch {
            kind: Exact,
            case_fold: false,
        };
    }

    let query_lower = query.to_lowercase();
    let candidate_lower = candidate.to_lowercase();

    if query_lower == candidate_lower {
        return FuzzyMatch {
            kind: ExactCaseInsensitive,
            case_fold: true,
        };
    }

    if candidate.starts_with(query) {
        return FuzzyMatch {
            kind: Prefix,
            case_fold: false,
        };
    }

    if candidate_lower.starts_with(&query_lower) {
        return FuzzyMatch {
            kind: PrefixCaseInsensitive,
            case_fold: true,
        };
    }

    if candidate.contains(query) {
        return FuzzyMatch {
            kind: Substring,
            case_fold: false,
        };
    }

    if candidate_lower.contains(&query_lower) {
        return FuzzyMatch {
            kind: Substring,
            case_fold: true,
        };
    }

    if is_subsequence(query, candidate) {
        return FuzzyMatch {
            kind: Subsequence,
            case_fold: false,
        };
    }

    if is_subsequence(&query_lower, &candidate_lower) {
        return FuzzyMatch {
            kind: Subsequence,
            case_fold: true,
        };
    }

    FuzzyMatch {
        kind: None,
        case_fold: false,
    }
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = haystack.chars();
    needle.chars().all(|n| chars.any(|h| h == n))
}
