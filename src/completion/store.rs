//! The process-wide store of completion schemas
//!
//! Each command a user has described carries a schema: a list of option
//! entries plus the derived short-option string. The store maps
//! `(cmd_is_path, cmd)` keys to schemas and is shared between the
//! interactive thread and autosuggestion workers.
//!
//! Locking discipline: the store lock guards the schema map; each
//! schema's mutable data sits behind its own inner lock. When both are
//! taken the store lock comes first, never the other way around. Long
//! traversals snapshot what they need under the locks and release them
//! before any user code runs.

use std::collections::BTreeMap;
use std::sync::Mutex;

use bitflags::bitflags;
use tracing::trace;

use super::candidate::CompleteFlags;

bitflags! {
    /// How a matched option shapes the rest of the completion
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ResultMode: u8 {
        /// Suppress the fallback file completion
        const NO_FILES = 1 << 0;
        /// The switch consumes the next token as its argument
        const NO_COMMON = 1 << 1;
    }
}

impl ResultMode {
    /// `NO_FILES | NO_COMMON`
    pub const EXCLUSIVE: ResultMode = ResultMode::from_bits_truncate(
        ResultMode::NO_FILES.bits() | ResultMode::NO_COMMON.bits(),
    );
}

/// One declared option of a command.
///
/// If `short_opt` and `long_opt` are both absent the entry is
/// positional: `arg_spec` supplies completions for plain arguments.
/// Otherwise the entry describes a switch, and `arg_spec` supplies the
/// values that may follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    /// Short style option letter
    pub short_opt: Option<char>,
    /// Long style option name (GNU `--name`, or old-style `-name`)
    pub long_opt: String,
    /// Source fragment evaluated to produce argument completions
    pub arg_spec: String,
    /// Description of the completion
    pub desc: String,
    /// Condition gating the option; empty means always
    pub condition: String,
    /// Completion behavior after this switch
    pub result_mode: ResultMode,
    /// True for old-style single-dash long options
    pub old_mode: bool,
    /// Flags stamped onto generated candidates
    pub flags: CompleteFlags,
}

impl OptionEntry {
    /// Whether this entry completes positional arguments
    pub fn is_positional(&self) -> bool {
        self.short_opt.is_none() && self.long_opt.is_empty()
    }
}

/// Mutable part of a schema, guarded by the inner lock
#[derive(Debug, Default)]
struct EntryData {
    /// Options, newest first
    options: Vec<OptionEntry>,
    /// Derived view: short letters in insertion order, `:` after each
    /// that consumes an argument
    short_opt_str: String,
    /// Whether the declared option set is exhaustive
    authoritative: bool,
}

/// A command's completion schema
#[derive(Debug)]
struct CompletionEntry {
    /// Creation stamp, used to sort printer output
    order: u64,
    data: Mutex<EntryData>,
}

/// Store key; derives the required ordering (bare commands before
/// paths, then lexicographic)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct StoreKey {
    cmd_is_path: bool,
    cmd: String,
}

/// Snapshot of a schema taken for lock-free iteration
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    pub cmd: String,
    pub cmd_is_path: bool,
    pub order: u64,
    pub authoritative: bool,
    pub short_opt_str: String,
    /// Options, newest first
    pub options: Vec<OptionEntry>,
}

struct StoreInner {
    map: BTreeMap<StoreKey, CompletionEntry>,
    next_order: u64,
}

/// The schema store
pub struct CompletionStore {
    inner: Mutex<StoreInner>,
}

impl Default for CompletionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                map: BTreeMap::new(),
                next_order: 0,
            }),
        }
    }

    /// Upsert the schema for `cmd` and prepend an option entry.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &self,
        cmd: &str,
        cmd_is_path: bool,
        short_opt: Option<char>,
        long_opt: &str,
        old_mode: bool,
        result_mode: ResultMode,
        condition: &str,
        arg_spec: &str,
        desc: &str,
        flags: CompleteFlags,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let inner = &mut *inner;
        let key = StoreKey {
            cmd_is_path,
            cmd: cmd.to_string(),
        };
        let next_order = &mut inner.next_order;
        let entry = inner.map.entry(key).or_insert_with(|| {
            *next_order += 1;
            CompletionEntry {
                order: *next_order,
                data: Mutex::new(EntryData::default()),
            }
        });

        let mut data = entry.data.lock().unwrap();
        if let Some(c) = short_opt {
            data.short_opt_str.push(c);
            if result_mode.contains(ResultMode::NO_COMMON) {
                data.short_opt_str.push(':');
            }
        }

        data.options.insert(
            0,
            OptionEntry {
                short_opt,
                long_opt: long_opt.to_string(),
                arg_spec: arg_spec.to_string(),
                desc: desc.to_string(),
                condition: condition.to_string(),
                result_mode,
                old_mode,
                flags,
            },
        );
        trace!(cmd, cmd_is_path, "added completion option");
    }

    /// Remove options from a schema.
    ///
    /// With both identifiers absent, every option goes; otherwise every
    /// option matching either identifier goes. A schema whose option
    /// list empties is deleted.
    pub fn remove(
        &self,
        cmd: &str,
        cmd_is_path: bool,
        short_opt: Option<char>,
        long_opt: Option<&str>,
    ) {
        let mut inner = self.inner.lock().unwrap();
        let key = StoreKey {
            cmd_is_path,
            cmd: cmd.to_string(),
        };
        let Some(entry) = inner.map.get(&key) else {
            return;
        };

        let now_empty = {
            let mut data = entry.data.lock().unwrap();
            if short_opt.is_none() && long_opt.is_none() {
                data.options.clear();
                data.short_opt_str.clear();
            } else {
                let matches = |o: &OptionEntry| {
                    (short_opt.is_some() && o.short_opt == short_opt)
                        || (long_opt.is_some() && long_opt == Some(o.long_opt.as_str()))
                };
                let doomed: Vec<OptionEntry> =
                    data.options.iter().filter(|o| matches(o)).cloned().collect();
                data.options.retain(|o| !matches(o));
                for o in doomed {
                    if let Some(c) = o.short_opt {
                        erase_short_opt(&mut data.short_opt_str, c);
                    }
                }
            }
            data.options.is_empty()
        };

        if now_empty {
            inner.map.remove(&key);
        }
    }

    /// Upsert the schema and set its authoritative flag
    pub fn set_authoritative(&self, cmd: &str, cmd_is_path: bool, authoritative: bool) {
        let mut inner = self.inner.lock().unwrap();
        let inner = &mut *inner;
        let key = StoreKey {
            cmd_is_path,
            cmd: cmd.to_string(),
        };
        let next_order = &mut inner.next_order;
        let entry = inner.map.entry(key).or_insert_with(|| {
            *next_order += 1;
            CompletionEntry {
                order: *next_order,
                data: Mutex::new(EntryData::default()),
            }
        });
        entry.data.lock().unwrap().authoritative = authoritative;
    }

    /// Snapshot every schema whose `cmd` pattern matches the bare
    /// command name (bare schemas) or the resolved path (path schemas).
    ///
    /// The snapshot is taken under both locks and handed back owned, so
    /// the caller can run user code without holding anything.
    pub fn matching_snapshots(&self, cmd_name: &str, cmd_path: &str) -> Vec<SchemaSnapshot> {
        let inner = self.inner.lock().unwrap();
        let mut result = Vec::new();
        for (key, entry) in &inner.map {
            let target = if key.cmd_is_path { cmd_path } else { cmd_name };
            if !pattern_matches(&key.cmd, target) {
                continue;
            }
            let data = entry.data.lock().unwrap();
            result.push(SchemaSnapshot {
                cmd: key.cmd.clone(),
                cmd_is_path: key.cmd_is_path,
                order: entry.order,
                authoritative: data.authoritative,
                short_opt_str: data.short_opt_str.clone(),
                options: data.options.clone(),
            });
        }
        result
    }

    /// Snapshot every schema, for the printer
    pub fn all_snapshots(&self) -> Vec<SchemaSnapshot> {
        let inner = self.inner.lock().unwrap();
        inner
            .map
            .iter()
            .map(|(key, entry)| {
                let data = entry.data.lock().unwrap();
                SchemaSnapshot {
                    cmd: key.cmd.clone(),
                    cmd_is_path: key.cmd_is_path,
                    order: entry.order,
                    authoritative: data.authoritative,
                    short_opt_str: data.short_opt_str.clone(),
                    options: data.options.clone(),
                }
            })
            .collect()
    }

    /// Number of schemas currently stored
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().map.len()
    }

    /// Whether the store holds no schemas
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Erase a short option letter and its following colon run from the
/// derived short-option string
fn erase_short_opt(short_opt_str: &mut String, letter: char) {
    let chars: Vec<char> = short_opt_str.chars().collect();
    if let Some(idx) = chars.iter().position(|&c| c == letter) {
        let mut end = idx + 1;
        while end < chars.len() && chars[end] == ':' {
            end += 1;
        }
        *short_opt_str = chars[..idx].iter().chain(chars[end..].iter()).collect();
    }
}

/// Match a schema's command pattern (a glob) against a target string
fn pattern_matches(pattern: &str, target: &str) -> bool {
    if target.is_empty() {
        return false;
    }
    match glob::Pattern::new(pattern) {
        Ok(p) => p.matches(target),
        Err(_) => pattern == target,
    }
}
