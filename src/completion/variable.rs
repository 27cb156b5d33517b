//! Environment variable completion
//!
//! The token is scanned left to right tracking quote state; the last
//! `$` seen unquoted or inside double quotes that heads a run of valid
//! variable-name characters marks a variable being typed. Candidates
//! come from the environment (or a test override), fuzzy-matched
//! against the partial name.

use super::candidate::CompleteFlags;
use super::session::Completer;
use crate::utils::{escape, string};

#[derive(PartialEq)]
enum QuoteMode {
    Unquoted,
    SingleQuoted,
    DoubleQuoted,
}

impl Completer<'_> {
    /// Try to complete `token` as a variable reference. Returns whether
    /// any candidate was produced.
    pub(crate) fn try_complete_variable(&mut self, token: &str) -> bool {
        let chars: Vec<char> = token.chars().collect();
        let mut mode = QuoteMode::Unquoted;

        // Char position just after the dollar heading a run of valid
        // variable characters
        let mut variable_start: Option<usize> = None;

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];

            if !string::is_variable_char(c) {
                variable_start = None;
            }

            match c {
                '\\' => {
                    i += 1;
                }
                '$' => {
                    if mode == QuoteMode::Unquoted || mode == QuoteMode::DoubleQuoted {
                        variable_start = Some(i);
                    }
                }
                '\'' => {
                    if mode == QuoteMode::SingleQuoted {
                        mode = QuoteMode::Unquoted;
                    } else if mode == QuoteMode::Unquoted {
                        mode = QuoteMode::SingleQuoted;
                    }
                }
                '"' => {
                    if mode == QuoteMode::DoubleQuoted {
                        mode = QuoteMode::Unquoted;
                    } else if mode == QuoteMode::Unquoted {
                        mode = QuoteMode::DoubleQuoted;
                    }
                }
                _ => {}
            }

            i += 1;
        }

        match variable_start {
            Some(start) if start + 1 < chars.len() => self.complete_variable(token, start + 1),
            _ => false,
        }
    }

    /// Complete the variable name starting at char offset
    /// `start_offset` within `token`
    pub(crate) fn complete_variable(&mut self, token: &str, start_offset: usize) -> bool {
        let chars: Vec<char> = token.chars().collect();
        let partial: String = chars[start_offset..].iter().collect();
        let partial_len = chars.len() - start_offset;

        let names = self.engine.variable_names();
        let mut res = false;

        for name in names {
            let m = self.fuzzy(&partial, &name);
            if m.is_none() {
                continue;
            }

            let (text, flags) = if !m.requires_full_replacement() {
                // Take only the suffix
                let suffix: String = name.chars().skip(partial_len).collect();
                (suffix, CompleteFlags::empty())
            } else {
                let prefix: String = chars[..start_offset].iter().collect();
                (
                    format!("{}{}", prefix, name),
                    CompleteFlags::REPLACES_TOKEN | CompleteFlags::DONT_ESCAPE,
                )
            };

            let mut desc = String::new();
            if self.wants_descriptions() {
                let Some(value) = self.engine.host().env.get(&name) else {
                    continue;
                };
                if !self.is_autosuggest() {
                    desc = format!("Variable: {}", escape::escape_string(&value));
                }
            }

            self.append(text, desc, flags, m);
            res = true;
        }

        res
    }
}
