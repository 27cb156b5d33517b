//! Utility functions and helpers for nacre
//!
//! This module provides common utility functions used throughout the
//! library:
//! - Shell escaping and unescaping
//! - Wildcard detection helpers
//! - Small string utilities

/// Shell escaping utilities
pub mod escape {
    /// Characters that must be backslash-escaped in an unquoted word.
    const SPECIALS: &str = "\\'\"$*?~#(){}[]<>&|; \t";

    /// Escape a string so that it reads back as a single shell word.
    ///
    /// # Arguments
    /// * `s` - String to escape
    ///
    /// # Returns
    /// * `String` - Escaped string
    pub fn escape_string(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            if c == '\n' {
                out.push_str("\\n");
            } else {
                if SPECIALS.contains(c) {
                    out.push('\\');
                }
                out.push(c);
            }
        }
        out
    }

    /// Quote a string in single quotes.
    ///
    /// Embedded single quotes use the POSIX close-reopen spelling
    /// (`'\''`). Used by the completion printer, which emits every
    /// argument in single quotes.
    pub fn quote_single(s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        out.push_str(&s.replace('\'', "'\\''"));
        out.push('\'');
        out
    }

    /// Remove one level of shell quoting and escaping from a word.
    ///
    /// When `allow_incomplete` is true, an unterminated quote or a
    /// trailing backslash is tolerated; this is what the completion
    /// engine needs, since the token under the cursor is usually still
    /// being typed.
    ///
    /// # Arguments
    /// * `s` - Word to unescape
    /// * `allow_incomplete` - Tolerate unterminated quoting
    ///
    /// # Returns
    /// * `Option<String>` - Unescaped word, or None on malformed input
    pub fn unescape_string(s: &str, allow_incomplete: bool) -> Option<String> {
        let mut out = String::with_capacity(s.len());
        let chars: Vec<char> = s.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\\' => {
                    if i + 1 < chars.len() {
                        out.push(chars[i + 1]);
                        i += 2;
                    } else if allow_incomplete {
                        i += 1;
                    } else {
                        return None;
                    }
                }
                '\'' => {
                    i += 1;
                    let mut closed = false;
                    while i < chars.len() {
                        if chars[i] == '\'' {
                            closed = true;
                            i += 1;
                            break;
                        }
                        out.push(chars[i]);
                        i += 1;
                    }
                    if !closed && !allow_incomplete {
                        return None;
                    }
                }
                '"' => {
                    i += 1;
                    let mut closed = false;
                    while i < chars.len() {
                        match chars[i] {
                            '"' => {
                                closed = true;
                                i += 1;
                                break;
                            }
                            '\\' if i + 1 < chars.len()
                                && matches!(chars[i + 1], '"' | '\\' | '$' | '`') =>
                            {
                                out.push(chars[i + 1]);
                                i += 2;
                            }
                            c => {
                                out.push(c);
                                i += 1;
                            }
                        }
                    }
                    if !closed && !allow_incomplete {
                        return None;
                    }
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        Some(out)
    }
}

/// Wildcard helpers
pub mod wildcard {
    /// Check whether a string contains an unescaped glob wildcard.
    pub fn has_wildcard(s: &str) -> bool {
        let mut escaped = false;
        for c in s.chars() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '*' | '?' | '[' => return true,
                _ => {}
            }
        }
        false
    }
}

/// String utilities
pub mod string {
    /// Check if a character may appear in a variable name.
    pub fn is_variable_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    /// Uppercase the first character of a string.
    pub fn uppercase_first(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }

    /// Test whether `s` starts with `prefix`, byte-wise.
    pub fn prefixes(prefix: &str, s: &str) -> bool {
        s.starts_with(prefix)
    }

    /// Case-insensitive prefix test (ASCII + Unicode simple folding).
    pub fn prefixes_insensitive(prefix: &str, s: &str) -> bool {
        let mut sc = s.chars();
        for pc in prefix.chars() {
            match sc.next() {
                Some(c) if c.to_lowercase().eq(pc.to_lowercase()) => {}
                _ => return false,
            }
        }
        true
    }
}
