//! Autoloading of per-command completion definition files
//!
//! A search path (colon-separated, named by a configurable environment
//! variable) holds one definition file per command. Files are sourced
//! on first use, re-sourced when their mtime advances and a reload is
//! requested, and unloaded (with their store entries removed) when they
//! disappear from the search path.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::SystemTime;

use tracing::debug;

use super::store::CompletionStore;
use crate::host::Host;

/// Extension of completion definition files
const DEFINITION_EXT: &str = "nacre";

#[derive(Debug)]
struct LoadedFile {
    path: PathBuf,
    mtime: Option<SystemTime>,
}

/// Tracks which commands have been tried and which files are loaded
pub(crate) struct Autoloader {
    path_var: String,
    loaded: HashMap<String, LoadedFile>,
    tried: HashSet<String>,
}

impl Autoloader {
    pub fn new(path_var: impl Into<String>) -> Self {
        Self {
            path_var: path_var.into(),
            loaded: HashMap::new(),
            tried: HashSet::new(),
        }
    }

    /// Whether a load has ever been attempted for `cmd`
    pub fn has_tried(&self, cmd: &str) -> bool {
        self.tried.contains(cmd)
    }

    /// Load the definition file for `cmd` if there is one. With
    /// `reload`, a file whose mtime advanced is unloaded and sourced
    /// again. Returns whether a definition file is loaded afterwards.
    pub fn load(&mut self, cmd: &str, reload: bool, host: &Host, store: &CompletionStore) -> bool {
        if cmd.is_empty() || cmd.contains('/') {
            return false;
        }
        self.tried.insert(cmd.to_string());

        let found = self.locate(cmd, host);

        match (found, self.loaded.contains_key(cmd)) {
            (None, true) => {
                // The file went away; reflect the unload in the store
                self.loaded.remove(cmd);
                store.remove(cmd, false, None, None);
                false
            }
            (None, false) => false,
            (Some(path), false) => {
                self.source(cmd, path, host);
                true
            }
            (Some(path), true) => {
                if reload {
                    let record = &self.loaded[cmd];
                    let mtime = file_mtime(&path);
                    let changed = record.path != path
                        || match (record.mtime, mtime) {
                            (Some(old), Some(new)) => new > old,
                            _ => false,
                        };
                    if changed {
                        store.remove(cmd, false, None, None);
                        self.source(cmd, path, host);
                    }
                }
                true
            }
        }
    }

    /// Find the definition file for `cmd` on the search path
    fn locate(&self, cmd: &str, host: &Host) -> Option<PathBuf> {
        let search_path = host.env.get(&self.path_var)?;
        for dir in search_path.split(':').filter(|d| !d.is_empty()) {
            let candidate = PathBuf::from(dir).join(format!("{}.{}", cmd, DEFINITION_EXT));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Source a definition file and record it. Failures are ignored;
    /// the file still counts as loaded so the next attempt waits for
    /// an mtime change.
    fn source(&mut self, cmd: &str, path: PathBuf, host: &Host) {
        if !host.subshell.source_file(&path) {
            debug!(cmd, path = %path.display(), "sourcing completion definitions failed");
        }
        let mtime = file_mtime(&path);
        self.loaded
            .insert(cmd.to_string(), LoadedFile { path, mtime });
    }
}

fn file_mtime(path: &PathBuf) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
