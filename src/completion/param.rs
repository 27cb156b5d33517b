//! The parameter matcher
//!
//! Given the command, the previous token, and the token under the
//! cursor, walk every matching schema and generate switch and
//! switch-argument completions. Schemas are snapshotted under the store
//! locks and iterated lock-free, because conditions and argument
//! specifications run user code that may itself touch the store.

use super::candidate::CompleteFlags;
use super::fuzzy::FuzzyMatch;
use super::session::Completer;
use super::store::{OptionEntry, ResultMode};
use crate::utils::string;

/// Match against an old style long option: `-name` equality
fn param_match_old(e: &OptionEntry, optstr: &str) -> bool {
    optstr.starts_with('-') && !e.long_opt.is_empty() && e.long_opt == optstr[1..]
}

/// Match a parameter: short by second character, or GNU `--name`
/// equality
fn param_match(e: &OptionEntry, optstr: &str) -> bool {
    if let Some(short) = e.short_opt {
        if optstr.chars().nth(1) == Some(short) {
            return true;
        }
    }

    if !e.old_mode && optstr.starts_with("--") && !e.long_opt.is_empty() {
        return e.long_opt == optstr[2..];
    }

    false
}

/// Test if a string is an option with an embedded argument, like
/// `--color=auto` or `-I/usr/include`; returns the argument part
fn param_match2<'a>(e: &OptionEntry, optstr: &'a str) -> Option<&'a str> {
    if let Some(short) = e.short_opt {
        let mut chars = optstr.char_indices();
        if let (Some((_, '-')), Some((_, c))) = (chars.next(), chars.next()) {
            if c == short && !optstr.starts_with("--") {
                return chars.next().map(|(idx, _)| &optstr[idx..]).or(Some(""));
            }
        }
    }

    if !e.old_mode && !e.long_opt.is_empty() {
        if let Some(rest) = optstr.strip_prefix("--") {
            if let Some(value) = rest.strip_prefix(e.long_opt.as_str()) {
                if let Some(value) = value.strip_prefix('=') {
                    return Some(value);
                }
            }
        }
    }

    None
}

/// Tests whether a short option is a viable completion of `arg`.
///
/// True iff the argument is empty, or it is a single-dash bundle that
/// does not already contain the letter, where every present letter is a
/// declared short option that takes no argument.
fn short_ok(arg: &str, nextopt: char, allopt: &str) -> bool {
    let mut chars = arg.chars();
    match chars.next() {
        None => return true,
        Some('-') => {}
        Some(_) => return false,
    }
    if arg[1..].starts_with('-') {
        return false;
    }
    if arg.contains(nextopt) {
        return false;
    }

    let allopt_chars: Vec<char> = allopt.chars().collect();
    for c in chars {
        let Some(pos) = allopt_chars.iter().position(|&a| a == c) else {
            return false;
        };
        if allopt_chars.get(pos + 1) == Some(&':') {
            return false;
        }
    }
    true
}

impl Completer<'_> {
    /// Find completions for the argument `current` of command
    /// `cmd_orig` with previous token `previous`. Returns whether file
    /// completion should still run.
    pub(crate) fn complete_param(
        &mut self,
        cmd_orig: &str,
        previous: &str,
        current: &str,
        use_switches: bool,
    ) -> bool {
        let (cmd_name, cmd_path) = self.engine.resolve_cmd(cmd_orig);

        if self.is_autosuggest() {
            // Off-thread: at most ask the main thread to try a load
            if !self.engine.has_tried_loading(&cmd_name) {
                self.engine
                    .host()
                    .main_thread
                    .post_completion_load(&cmd_name);
            }
        } else {
            self.engine.load(&cmd_name, true);
        }

        let snapshots = self
            .engine
            .store()
            .matching_snapshots(&cmd_name, &cmd_path);

        let mut use_files = true;

        for schema in &snapshots {
            let mut use_common = true;

            if use_switches {
                if current.starts_with('-') {
                    // Combined option and argument, like --color=auto
                    // or -I/usr/include
                    for o in &schema.options {
                        if let Some(arg) = param_match2(o, current) {
                            let arg = arg.to_string();
                            if self.condition_test(&o.condition) {
                                if o.result_mode.contains(ResultMode::NO_COMMON) {
                                    use_common = false;
                                }
                                if o.result_mode.contains(ResultMode::NO_FILES) {
                                    use_files = false;
                                }
                                self.complete_from_args(&arg, &o.arg_spec, &o.desc, o.flags);
                            }
                        }
                    }
                } else if previous.starts_with('-') {
                    // Old-style options are checked first; the first
                    // hit claims the token
                    let mut old_style_match = false;
                    for o in &schema.options {
                        if o.old_mode
                            && param_match_old(o, previous)
                            && self.condition_test(&o.condition)
                        {
                            old_style_match = true;
                            if o.result_mode.contains(ResultMode::NO_COMMON) {
                                use_common = false;
                            }
                            if o.result_mode.contains(ResultMode::NO_FILES) {
                                use_files = false;
                            }
                            self.complete_from_args(current, &o.arg_spec, &o.desc, o.flags);
                        }
                    }

                    if !old_style_match {
                        for o in &schema.options {
                            // GNU options with an optional argument
                            // must take it in one token via '='; the
                            // next token is never theirs
                            if !o.old_mode
                                && !o.long_opt.is_empty()
                                && !o.result_mode.contains(ResultMode::NO_COMMON)
                            {
                                continue;
                            }

                            if param_match(o, previous) && self.condition_test(&o.condition) {
                                if o.result_mode.contains(ResultMode::NO_COMMON) {
                                    use_common = false;
                                }
                                if o.result_mode.contains(ResultMode::NO_FILES) {
                                    use_files = false;
                                }
                                self.complete_from_args(current, &o.arg_spec, &o.desc, o.flags);
                            }
                        }
                    }
                }
            }

            if !use_common {
                continue;
            }

            // Common pass: positional arguments plus the switches
            // themselves
            for o in &schema.options {
                if !self.condition_test(&o.condition) {
                    continue;
                }

                if o.is_positional() {
                    if o.result_mode.contains(ResultMode::NO_FILES) {
                        use_files = false;
                    }
                    self.complete_from_args(current, &o.arg_spec, &o.desc, o.flags);
                }

                if current.is_empty() || !use_switches {
                    continue;
                }

                let desc = if self.wants_descriptions() {
                    o.desc.clone()
                } else {
                    String::new()
                };

                // Short options viable in the current bundle
                if let Some(short) = o.short_opt {
                    if short_ok(current, short, &schema.short_opt_str) {
                        self.append(
                            short.to_string(),
                            desc.clone(),
                            CompleteFlags::AUTO_SPACE,
                            FuzzyMatch::exact(),
                        );
                    }
                }

                // Long options matched by prefix
                if !o.long_opt.is_empty() {
                    let whole = format!("{}{}", if o.old_mode { "-" } else { "--" }, o.long_opt);

                    let is_prefix = string::prefixes(current, &whole);
                    let is_prefix_ci =
                        !is_prefix && string::prefixes_insensitive(current, &whole);

                    if is_prefix || is_prefix_ci {
                        let (offset, flags) = if is_prefix {
                            (current.len(), CompleteFlags::AUTO_SPACE)
                        } else {
                            (0, CompleteFlags::REPLACES_TOKEN | CompleteFlags::AUTO_SPACE)
                        };

                        let has_arg = !o.arg_spec.is_empty();
                        let req_arg = o.result_mode.contains(ResultMode::NO_COMMON);

                        if !o.old_mode && has_arg && !req_arg {
                            // An optional argument can only arrive via
                            // '=', so offer that spelling as well
                            self.append(
                                format!("{}=", &whole[offset..]),
                                desc.clone(),
                                flags,
                                FuzzyMatch::exact(),
                            );
                        }

                        self.append(
                            whole[offset..].to_string(),
                            desc.clone(),
                            flags,
                            FuzzyMatch::exact(),
                        );
                    }
                }
            }
        }

        use_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(short: Option<char>, long: &str, old: bool) -> OptionEntry {
        OptionEntry {
            short_opt: short,
            long_opt: long.to_string(),
            arg_spec: String::new(),
            desc: String::new(),
            condition: String::new(),
            result_mode: ResultMode::empty(),
            old_mode: old,
            flags: CompleteFlags::empty(),
        }
    }

    #[test]
    fn test_param_match_short() {
        let e = entry(Some('b'), "branch", false);
        assert!(param_match(&e, "-b"));
        assert!(!param_match(&e, "-x"));
    }

    #[test]
    fn test_param_match_gnu_long() {
        let e = entry(None, "branch", false);
        assert!(param_match(&e, "--branch"));
        assert!(!param_match(&e, "--bran"));
        assert!(!param_match(&e, "-branch"));
    }

    #[test]
    fn test_param_match_old_ignores_gnu() {
        let e = entry(None, "ansi", true);
        assert!(param_match_old(&e, "-ansi"));
        assert!(!param_match(&e, "--ansi"));
    }

    #[test]
    fn test_param_match2_short_combined() {
        let e = entry(Some('I'), "", false);
        assert_eq!(param_match2(&e, "-I/usr/include"), Some("/usr/include"));
        assert_eq!(param_match2(&e, "-I"), Some(""));
        assert_eq!(param_match2(&e, "-X/path"), None);
    }

    #[test]
    fn test_param_match2_gnu_equals() {
        let e = entry(None, "branch", false);
        assert_eq!(param_match2(&e, "--branch=mas"), Some("mas"));
        assert_eq!(param_match2(&e, "--branch"), None);
        assert_eq!(param_match2(&e, "--branches=x"), None);
    }

    #[test]
    fn test_param_match2_old_mode_excluded() {
        let e = OptionEntry {
            old_mode: true,
            ..entry(None, "branch", false)
        };
        assert_eq!(param_match2(&e, "--branch=mas"), None);
    }

    #[test]
    fn test_short_ok_empty_arg() {
        assert!(short_ok("", 'x', "xyz"));
    }

    #[test]
    fn test_short_ok_rejects_non_dash() {
        assert!(!short_ok("abc", 'x', "xyz"));
    }

    #[test]
    fn test_short_ok_rejects_double_dash() {
        assert!(!short_ok("--foo", 'x', "xyz"));
    }

    #[test]
    fn test_short_ok_rejects_duplicate() {
        assert!(!short_ok("-x", 'x', "xyz"));
    }

    #[test]
    fn test_short_ok_bundles() {
        // All present letters declared, none taking an argument
        assert!(short_ok("-yz", 'x', "xyz"));
        // 'q' is not declared
        assert!(!short_ok("-q", 'x', "xyz"));
        // 'f' takes an argument, so the bundle is closed
        assert!(!short_ok("-f", 'x', "f:xyz"));
    }
}
