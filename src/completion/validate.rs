//! Option validation against the completion store
//!
//! Given a command and a typed option, decide whether the option is
//! plausible: short options are checked letter by letter against the
//! declared short-option string, old-style options by equality, and GNU
//! options by unique prefix. Only authoritative schemas can reject; when
//! every matching schema is non-authoritative (or none matches) the
//! verdict falls back to a configurable accept.

use std::collections::BTreeSet;

use super::engine::CompletionEngine;

/// Validate an argument supplied to a switch.
///
/// A hook for embedding shells; the engine itself accepts anything.
pub fn is_valid_argument(_cmd: &str, _opt: &str, _arg: &str) -> bool {
    true
}

pub(crate) fn is_valid_option(
    engine: &CompletionEngine,
    cmd: &str,
    opt: &str,
    mut errors: Option<&mut Vec<String>>,
    allow_autoload: bool,
) -> bool {
    if opt.is_empty() {
        return false;
    }
    if opt.chars().count() == 1 {
        return true;
    }
    if opt == "--" {
        return true;
    }
    if !opt.starts_with('-') {
        if let Some(errors) = errors.as_deref_mut() {
            errors.push("Option does not begin with a '-'".to_string());
        }
        return false;
    }

    let is_gnu = opt.starts_with("--");
    let gnu_name: &str = if is_gnu {
        let rest = &opt[2..];
        match rest.find('=') {
            Some(idx) => &rest[..idx],
            None => rest,
        }
    } else {
        ""
    };

    let (cmd_name, cmd_path) = engine.resolve_cmd(cmd);

    if allow_autoload {
        engine.load(&cmd_name, false);
    }

    let snapshots = engine.store().matching_snapshots(&cmd_name, &cmd_path);

    let mut found_match = false;
    let mut authoritative = true;
    let mut gnu_match_set: BTreeSet<String> = BTreeSet::new();
    let mut is_gnu_exact = false;
    let mut is_old_opt = false;
    // For every position in a short-option bundle, whether it checked out
    let short_chars: Vec<char> = opt.chars().skip(1).collect();
    let mut short_validated = vec![false; short_chars.len()];

    'schemas: for schema in &snapshots {
        found_match = true;
        if !schema.authoritative {
            authoritative = false;
            break;
        }

        if is_gnu {
            for o in &schema.options {
                if o.old_mode {
                    continue;
                }
                if o.long_opt == gnu_name {
                    is_gnu_exact = true;
                } else if o.long_opt.starts_with(gnu_name) {
                    gnu_match_set.insert(o.long_opt.clone());
                }
            }
        } else {
            // Old-style options win outright on an exact match
            for o in &schema.options {
                if o.old_mode && o.long_opt == opt[1..] {
                    is_old_opt = true;
                    break 'schemas;
                }
            }

            let short_opts: Vec<char> = schema.short_opt_str.chars().collect();
            for (idx, &c) in short_chars.iter().enumerate() {
                let Some(pos) = short_opts.iter().position(|&s| s == c) else {
                    continue;
                };
                if short_opts.get(pos + 1) == Some(&':') {
                    // Everything after an argument-taking letter is its
                    // embedded argument
                    let nopt = format!("-{}", c);
                    let arg: String = short_chars[idx + 1..].iter().collect();
                    if is_valid_argument(cmd, &nopt, &arg) {
                        for v in short_validated.iter_mut().skip(idx) {
                            *v = true;
                        }
                    }
                    break;
                }
                short_validated[idx] = true;
            }
        }
    }

    if !(authoritative && found_match) {
        return engine.config().accept_unvalidated_options;
    }

    if is_old_opt {
        return true;
    }

    if is_gnu {
        let opt_found = is_gnu_exact || gnu_match_set.len() == 1;
        if !opt_found {
            if let Some(errors) = errors.as_deref_mut() {
                let prefix = if gnu_match_set.is_empty() {
                    "Unknown option: "
                } else {
                    "Multiple matches for option: "
                };
                errors.push(format!("{}'{}'", prefix, opt));
            }
        }
        return opt_found;
    }

    // Short-option bundle: every letter must have validated
    let mut opt_found = true;
    for (idx, ok) in short_validated.iter().enumerate() {
        if !ok {
            if let Some(errors) = errors.as_deref_mut() {
                errors.push(format!("Unknown option: '{}'", short_chars[idx]));
            }
            opt_found = false;
            break;
        }
    }
    opt_found
}
