//! A completion session
//!
//! One [`Completer`] is created per request, drives the completion
//! algorithm to the end, and is discarded. It owns the result vector
//! and the condition cache; candidates are appended in the exact order
//! the algorithm produces them and never reordered here.

use std::collections::HashMap;

use bitflags::bitflags;
use tracing::debug;

use super::candidate::{append_completion, CompleteFlags, Completion};
use super::engine::CompletionEngine;
use super::fuzzy::{fuzzy_match, FuzzyMatch, FuzzyMatchKind};
use crate::expand::{ExpandFlags, ExpandResult};
use crate::parser::{cmdsubst_extent, plain_statement_at, token_extent, Decoration};
use crate::utils::{escape, wildcard};

bitflags! {
    /// Flags of a completion request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompletionRequestFlags: u8 {
        /// Populate candidate descriptions
        const DESCRIPTIONS = 1 << 0;
        /// Enable all fuzzy match kinds, not just prefixes
        const FUZZY_MATCH = 1 << 1;
        /// Best-effort background variant: never execute user code
        const AUTOSUGGESTION = 1 << 2;
    }
}

/// An attempt to compute completions
pub(crate) struct Completer<'a> {
    pub(crate) engine: &'a CompletionEngine,
    flags: CompletionRequestFlags,
    completions: Vec<Completion>,
    /// Conditions already tested this session and their results
    condition_cache: HashMap<String, bool>,
}

impl<'a> Completer<'a> {
    pub fn new(engine: &'a CompletionEngine, flags: CompletionRequestFlags) -> Self {
        Self {
            engine,
            flags,
            completions: Vec::new(),
            condition_cache: HashMap::new(),
        }
    }

    pub fn into_completions(self) -> Vec<Completion> {
        self.completions
    }

    pub(crate) fn is_autosuggest(&self) -> bool {
        self.flags.contains(CompletionRequestFlags::AUTOSUGGESTION)
    }

    pub(crate) fn wants_descriptions(&self) -> bool {
        self.flags.contains(CompletionRequestFlags::DESCRIPTIONS)
    }

    fn is_fuzzy(&self) -> bool {
        self.flags.contains(CompletionRequestFlags::FUZZY_MATCH)
    }

    /// The worst fuzzy match kind this session accepts
    fn max_fuzzy_kind(&self) -> FuzzyMatchKind {
        if self.is_fuzzy() {
            FuzzyMatchKind::Subsequence
        } else {
            FuzzyMatchKind::PrefixCaseInsensitive
        }
    }

    /// Classify a candidate against a query under the session cap
    pub(crate) fn fuzzy(&self, query: &str, candidate: &str) -> FuzzyMatch {
        fuzzy_match(query, candidate, self.max_fuzzy_kind())
    }

    /// Expansion flags implied by the session mode
    pub(crate) fn expand_flags(&self) -> ExpandFlags {
        let mut flags = ExpandFlags::empty();
        if self.is_autosuggest() {
            flags |= ExpandFlags::SKIP_CMDSUBST;
        }
        if self.is_fuzzy() {
            flags |= ExpandFlags::FUZZY_MATCH;
        }
        flags
    }

    pub(crate) fn completions(&self) -> &[Completion] {
        &self.completions
    }

    pub(crate) fn completions_mut(&mut self) -> &mut Vec<Completion> {
        &mut self.completions
    }

    pub(crate) fn append(
        &mut self,
        text: String,
        description: String,
        flags: CompleteFlags,
        match_kind: FuzzyMatch,
    ) {
        append_completion(&mut self.completions, text, description, flags, match_kind);
    }

    pub(crate) fn expand_into_completions(
        &mut self,
        input: &str,
        flags: ExpandFlags,
    ) -> ExpandResult {
        self.engine
            .host()
            .expander
            .expand(input, &mut self.completions, flags)
    }

    /// Test whether a condition script succeeds, memoized per session.
    ///
    /// Empty conditions always pass; in autosuggest mode every
    /// condition fails, because subshell execution is unsafe off the
    /// main thread.
    pub(crate) fn condition_test(&mut self, condition: &str) -> bool {
        if condition.is_empty() {
            return true;
        }
        if self.is_autosuggest() {
            return false;
        }

        if let Some(&cached) = self.condition_cache.get(condition) {
            return cached;
        }
        let result = self.engine.host().subshell.run_status(condition);
        self.condition_cache.insert(condition.to_string(), result);
        result
    }

    /// Match every string in `possible` against the unescaped pattern
    /// `pattern`, appending hits.
    ///
    /// Descriptions resolve in order: a non-empty `desc_fn` result,
    /// then the static `desc`.
    pub(crate) fn complete_strings(
        &mut self,
        pattern: &str,
        desc: &str,
        desc_fn: Option<&dyn Fn(&str) -> String>,
        possible: &[String],
        flags: CompleteFlags,
    ) {
        for name in possible {
            if name.is_empty() {
                continue;
            }
            self.wildcard_complete(name, pattern, desc, desc_fn, flags);
        }
    }

    /// Complete one string against a pattern that may carry wildcards
    fn wildcard_complete(
        &mut self,
        name: &str,
        pattern: &str,
        desc: &str,
        desc_fn: Option<&dyn Fn(&str) -> String>,
        flags: CompleteFlags,
    ) {
        let description = |this: &Self, name: &str| -> String {
            if !this.wants_descriptions() {
                return String::new();
            }
            if let Some(f) = desc_fn {
                let d = f(name);
                if !d.is_empty() {
                    return d;
                }
            }
            desc.to_string()
        };

        if wildcard::has_wildcard(pattern) {
            let hit = match glob::Pattern::new(&format!("{}*", pattern)) {
                Ok(p) => p.matches(name),
                Err(_) => name.starts_with(pattern),
            };
            if hit {
                let desc = description(self, name);
                self.append(
                    name.to_string(),
                    desc,
                    flags | CompleteFlags::REPLACES_TOKEN | CompleteFlags::AUTO_SPACE,
                    FuzzyMatch::exact(),
                );
            }
            return;
        }

        let m = self.fuzzy(pattern, name);
        if m.is_none() {
            return;
        }

        let desc = description(self, name);
        if !m.requires_full_replacement() {
            let suffix: String = name.chars().skip(pattern.chars().count()).collect();
            self.append(suffix, desc, flags | CompleteFlags::AUTO_SPACE, m);
        } else {
            self.append(
                name.to_string(),
                desc,
                flags | CompleteFlags::REPLACES_TOKEN | CompleteFlags::AUTO_SPACE,
                m,
            );
        }
    }

    /// Evaluate an option's argument specification and complete
    /// `current` against the resulting words
    pub(crate) fn complete_from_args(
        &mut self,
        current: &str,
        arg_spec: &str,
        desc: &str,
        flags: CompleteFlags,
    ) {
        if arg_spec.is_empty() {
            return;
        }
        let words = self
            .engine
            .host()
            .subshell
            .eval_args(arg_spec, self.is_autosuggest());
        self.complete_strings(current, desc, None, &words, flags);
    }

    /// Perform file expansion on the raw token `sstr`
    pub(crate) fn complete_param_expand(&mut self, sstr: &str, do_file: bool) {
        // For --flag=value tokens, complete the value part only
        let comp_str = if sstr.starts_with("--") {
            match sstr.find('=') {
                Some(idx) => &sstr[idx + 1..],
                None => sstr,
            }
        } else {
            sstr
        };

        let mut flags =
            ExpandFlags::SKIP_CMDSUBST | ExpandFlags::ACCEPT_INCOMPLETE | self.expand_flags();

        if !do_file {
            flags |= ExpandFlags::SKIP_WILDCARDS;
        }

        // File descriptions are noise in autosuggestions and in plain
        // file fallback
        if self.is_autosuggest() || do_file {
            flags |= ExpandFlags::NO_DESCRIPTIONS;
        }

        // No fuzzy matching for tokens that look like switches
        if sstr.starts_with('-') {
            flags.remove(ExpandFlags::FUZZY_MATCH);
        }

        if self.expand_into_completions(comp_str, flags) == ExpandResult::Error {
            debug!(token = comp_str, "error while expanding string");
        }
    }

    /// The driver: run the full completion algorithm for `line`, with
    /// the cursor at its end
    pub fn run(&mut self, line: &str) {
        // Operate on the innermost command substitution around the
        // cursor
        let span = cmdsubst_extent(line, line.len());
        let cmd = &line[span];
        let pos = cmd.len();

        let token_range = token_extent(cmd, pos);
        let current_token = cmd[token_range].to_string();

        // Variable and user completion short-circuit everything else
        if self.try_complete_variable(&current_token) || self.try_complete_user(&current_token) {
            return;
        }

        // Backtrack the cursor over trailing spaces to find the
        // statement it belongs to
        let mut adjusted_pos = pos;
        while adjusted_pos > 0 && cmd.as_bytes()[adjusted_pos - 1] == b' ' {
            adjusted_pos -= 1;
        }

        let Some(statement) = plain_statement_at(cmd, adjusted_pos) else {
            // Not part of a plain statement (e.g. a loop header). Do
            // generic file completions, except in autosuggest mode when
            // backtracking actually moved the cursor.
            let no_file = self.is_autosuggest() && adjusted_pos < pos;
            self.complete_param_expand(&current_token, !no_file);
            return;
        };

        let (use_command, use_function, use_builtin) = match statement.decoration {
            Decoration::None => (true, true, true),
            Decoration::Command | Decoration::Exec => (true, false, false),
            Decoration::Builtin => (false, false, true),
        };

        let cmd_span = &statement.command.span;
        if cmd_span.start <= pos && pos <= cmd_span.end {
            // On the command word itself
            self.complete_cmd(&current_token, use_function, use_builtin, use_command);
            return;
        }

        // Find which argument the cursor sits on, if any
        let matching_arg_index = statement
            .args
            .iter()
            .position(|a| a.span.start <= pos && pos <= a.span.end);

        let mut current_argument = String::new();
        let mut previous_argument = String::new();
        let mut had_ddash = false;

        if let Some(idx) = matching_arg_index {
            current_argument = statement.args[idx].word().to_string();
            if idx > 0 {
                previous_argument = statement.args[idx - 1].word().to_string();
            }
            had_ddash = statement.args[..idx].iter().any(|a| a.word() == "--");
        }

        let mut do_file = false;
        let mut current_unescaped = String::new();

        let unescaped = (
            escape::unescape_string(statement.command.word(), false),
            escape::unescape_string(&previous_argument, false),
            escape::unescape_string(&current_argument, true),
        );
        if let (Some(cmd_text), Some(prev), Some(cur)) = unescaped {
            current_unescaped = cur;
            do_file = self.complete_param(&cmd_text, &prev, &current_unescaped, !had_ddash);
        }

        // No command specific completions at all: fall back to files
        if self.completions.is_empty() {
            do_file = true;
        }

        // When autosuggesting into an empty argument, file suggestions
        // would be arbitrary; skip them
        if self.is_autosuggest() && current_unescaped.is_empty() {
            do_file = false;
        }

        self.complete_param_expand(&current_token, do_file);
    }
}
