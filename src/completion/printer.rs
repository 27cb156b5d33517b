//! Round-trip serialization of the completion store
//!
//! `print` renders the store as a sequence of `complete …` commands,
//! one per option; `parse_complete_line` reads one such line back.
//! Replaying the printed output against an empty store reproduces the
//! original option multiset.

use super::candidate::CompleteFlags;
use super::store::{CompletionStore, ResultMode};
use crate::parser::{TokenKind, Tokenizer};
use crate::utils::escape;

/// Serialize the store, sorted by schema creation order
pub fn print(store: &CompletionStore) -> String {
    let mut snapshots = store.all_snapshots();
    snapshots.sort_by_key(|s| s.order);

    let mut out = String::new();
    for schema in &snapshots {
        for o in &schema.options {
            out.push_str("complete");
            out.push_str(mode_str(o.result_mode));

            append_switch(
                &mut out,
                if schema.cmd_is_path { "path" } else { "command" },
                &schema.cmd,
            );

            if let Some(c) = o.short_opt {
                out.push_str(" --short-option ");
                out.push_str(&escape::quote_single(&c.to_string()));
            }

            append_switch(
                &mut out,
                if o.old_mode { "old-option" } else { "long-option" },
                &o.long_opt,
            );

            append_switch(&mut out, "description", &o.desc);
            append_switch(&mut out, "arguments", &o.arg_spec);
            append_switch(&mut out, "condition", &o.condition);

            out.push('\n');
        }
    }
    out
}

fn mode_str(mode: ResultMode) -> &'static str {
    match (
        mode.contains(ResultMode::NO_FILES),
        mode.contains(ResultMode::NO_COMMON),
    ) {
        (false, false) => "",
        (true, false) => " --no-files",
        (false, true) => " --require-parameter",
        (true, true) => " --exclusive",
    }
}

/// Append ` --<name> '<value>'`, but only for non-empty values
fn append_switch(out: &mut String, name: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    out.push_str(" --");
    out.push_str(name);
    out.push(' ');
    out.push_str(&escape::quote_single(value));
}

/// A parsed `complete …` line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedComplete {
    pub cmd: String,
    pub cmd_is_path: bool,
    pub short_opt: Option<char>,
    pub long_opt: String,
    pub old_mode: bool,
    pub result_mode: ResultMode,
    pub condition: String,
    pub arg_spec: String,
    pub desc: String,
}

/// Parse one line of printer output. Returns `None` for anything that
/// is not a well-formed `complete` command.
pub fn parse_complete_line(line: &str) -> Option<ParsedComplete> {
    let words: Vec<String> = Tokenizer::tokenize(line)
        .into_iter()
        .filter_map(|t| match t.kind {
            TokenKind::Word(raw) => escape::unescape_string(&raw, false),
            _ => None,
        })
        .collect();

    let mut iter = words.into_iter();
    if iter.next()? != "complete" {
        return None;
    }

    let mut parsed = ParsedComplete::default();
    let mut have_cmd = false;

    while let Some(word) = iter.next() {
        match word.as_str() {
            "--no-files" => parsed.result_mode |= ResultMode::NO_FILES,
            "--require-parameter" => parsed.result_mode |= ResultMode::NO_COMMON,
            "--exclusive" => parsed.result_mode |= ResultMode::EXCLUSIVE,
            "--command" => {
                parsed.cmd = iter.next()?;
                parsed.cmd_is_path = false;
                have_cmd = true;
            }
            "--path" => {
                parsed.cmd = iter.next()?;
                parsed.cmd_is_path = true;
                have_cmd = true;
            }
            "--short-option" => {
                let value = iter.next()?;
                parsed.short_opt = value.chars().next();
            }
            "--long-option" => {
                parsed.long_opt = iter.next()?;
                parsed.old_mode = false;
            }
            "--old-option" => {
                parsed.long_opt = iter.next()?;
                parsed.old_mode = true;
            }
            "--description" => parsed.desc = iter.next()?,
            "--arguments" => parsed.arg_spec = iter.next()?,
            "--condition" => parsed.condition = iter.next()?,
            _ => return None,
        }
    }

    have_cmd.then_some(parsed)
}

/// Replay one printed line into a store
pub fn replay_line(store: &CompletionStore, line: &str) -> bool {
    match parse_complete_line(line) {
        Some(p) => {
            store.add(
                &p.cmd,
                p.cmd_is_path,
                p.short_opt,
                &p.long_opt,
                p.old_mode,
                p.result_mode,
                &p.condition,
                &p.arg_spec,
                &p.desc,
                CompleteFlags::empty(),
            );
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn sample_store() -> CompletionStore {
        let store = CompletionStore::new();
        store.add(
            "git",
            false,
            Some('b'),
            "branch",
            false,
            ResultMode::NO_COMMON,
            "test -d .git",
            "master develop",
            "Branch to use",
            CompleteFlags::empty(),
        );
        store.add(
            "git",
            false,
            None,
            "help",
            false,
            ResultMode::empty(),
            "",
            "",
            "Show help",
            CompleteFlags::empty(),
        );
        store.add(
            "/usr/bin/tar",
            true,
            Some('f'),
            "",
            false,
            ResultMode::EXCLUSIVE,
            "",
            "",
            "Archive file",
            CompleteFlags::empty(),
        );
        store.add(
            "gcc",
            false,
            None,
            "ansi",
            true,
            ResultMode::empty(),
            "",
            "",
            "",
            CompleteFlags::empty(),
        );
        store
    }

    #[test]
    fn test_print_one_line_per_option() {
        let out = print(&sample_store());
        assert_eq!(out.lines().count(), 4);
        assert!(out.lines().all(|l| l.starts_with("complete")));
    }

    #[test]
    fn test_print_sorted_by_order() {
        let out = print(&sample_store());
        let lines: Vec<&str> = out.lines().collect();
        // git (order 1) before tar (order 2) before gcc (order 3)
        assert!(lines[0].contains("'git'"));
        assert!(lines[2].contains("'/usr/bin/tar'"));
        assert!(lines[3].contains("'gcc'"));
    }

    #[test]
    fn test_print_modes_and_switches() {
        let out = print(&sample_store());
        assert!(out.contains("complete --require-parameter --command 'git'"));
        assert!(out.contains("--short-option 'b'"));
        assert!(out.contains("--long-option 'branch'"));
        assert!(out.contains("--arguments 'master develop'"));
        assert!(out.contains("--condition 'test -d .git'"));
        assert!(out.contains("complete --exclusive --path '/usr/bin/tar'"));
        assert!(out.contains("--old-option 'ansi'"));
    }

    #[test]
    fn test_parse_complete_line() {
        let p = parse_complete_line(
            "complete --require-parameter --command 'git' --short-option 'b' \
             --long-option 'branch' --description 'Branch to use' \
             --arguments 'master develop' --condition 'test -d .git'",
        )
        .unwrap();
        assert_eq!(p.cmd, "git");
        assert!(!p.cmd_is_path);
        assert_eq!(p.short_opt, Some('b'));
        assert_eq!(p.long_opt, "branch");
        assert!(!p.old_mode);
        assert_eq!(p.result_mode, ResultMode::NO_COMMON);
        assert_eq!(p.arg_spec, "master develop");
        assert_eq!(p.condition, "test -d .git");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_complete_line("echo hello").is_none());
        assert!(parse_complete_line("complete --bogus-flag 'x'").is_none());
        assert!(parse_complete_line("complete --no-files").is_none());
    }

    #[test]
    fn test_round_trip() {
        let store = sample_store();
        let printed = print(&store);

        let replayed = CompletionStore::new();
        for line in printed.lines() {
            assert!(replay_line(&replayed, line), "line failed: {}", line);
        }

        // The replayed store's options form the same multiset; compare
        // through the printer, ignoring line order.
        let reprinted = print(&replayed);
        let a: BTreeSet<&str> = printed.lines().collect();
        let b: BTreeSet<&str> = reprinted.lines().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_trip_quoting() {
        let store = CompletionStore::new();
        store.add(
            "awk",
            false,
            None,
            "field",
            false,
            ResultMode::empty(),
            "",
            "",
            "it's a 'quoted' description",
            CompleteFlags::empty(),
        );
        let printed = print(&store);
        let parsed = parse_complete_line(printed.trim_end()).unwrap();
        assert_eq!(parsed.desc, "it's a 'quoted' description");
    }
}
