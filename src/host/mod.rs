//! Trait seams for the shell runtime
//!
//! The completion engine treats the rest of the shell as a set of
//! collaborators with narrow interfaces: the environment store, the
//! function and builtin registries, the subshell executor, the password
//! database, and the main-thread dispatch queue. Each seam has a
//! default implementation good enough for a standalone library;
//! embedding shells swap in their own.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::expand::{Expander, FilesystemExpander};
use crate::parser::{TokenKind, Tokenizer};
use crate::utils::escape;

/// Environment variable store
pub trait EnvProvider: Send + Sync {
    /// Get a variable's value
    fn get(&self, name: &str) -> Option<String>;

    /// Enumerate variable names
    fn names(&self) -> Vec<String>;
}

/// Environment provider backed by the process environment
#[derive(Debug, Default)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn names(&self) -> Vec<String> {
        std::env::vars().map(|(k, _)| k).collect()
    }
}

/// Shell function registry
pub trait FunctionRegistry: Send + Sync {
    /// Enumerate function names. Names starting with `_` are
    /// considered hidden and only returned when asked for.
    fn names(&self, include_hidden: bool) -> Vec<String>;

    /// Get a function's description
    fn description(&self, name: &str) -> Option<String>;

    /// Get a function's definition, used as a fallback description
    fn definition(&self, name: &str) -> Option<String>;
}

/// Builtin command registry
pub trait BuiltinRegistry: Send + Sync {
    /// Enumerate builtin names
    fn names(&self) -> Vec<String>;

    /// Get a builtin's description
    fn description(&self, name: &str) -> Option<String>;
}

/// A registry over a fixed table, usable for both functions and
/// builtins
#[derive(Debug, Default)]
pub struct StaticRegistry {
    entries: HashMap<String, String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(name, description)` pairs
    pub fn with_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl FunctionRegistry for StaticRegistry {
    fn names(&self, include_hidden: bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .keys()
            .filter(|n| include_hidden || !n.starts_with('_'))
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn description(&self, name: &str) -> Option<String> {
        self.entries.get(name).filter(|d| !d.is_empty()).cloned()
    }

    fn definition(&self, _name: &str) -> Option<String> {
        None
    }
}

impl BuiltinRegistry for StaticRegistry {
    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    fn description(&self, name: &str) -> Option<String> {
        self.entries.get(name).filter(|d| !d.is_empty()).cloned()
    }
}

/// The builtins every nacre shell carries
pub fn default_builtins() -> StaticRegistry {
    StaticRegistry::with_entries([
        ("cd", "Change the current directory"),
        ("echo", "Write arguments to standard output"),
        ("exit", "Exit the shell"),
        ("export", "Set an exported variable"),
        ("set", "Set a shell variable"),
        ("source", "Evaluate a file in the current shell"),
        ("complete", "Edit command-specific completions"),
        ("jobs", "List background jobs"),
        ("fg", "Bring a job to the foreground"),
        ("bg", "Continue a job in the background"),
    ])
}

/// Subshell execution seam.
///
/// The engine only ever asks for three things: an exit status, captured
/// output lines, and evaluation of an argument list. The default
/// implementation executes nothing, so conditions fail closed and
/// description lookups come back empty, matching the engine's error
/// contract.
pub trait SubshellExecutor: Send + Sync {
    /// Run a script, reporting whether it exited successfully
    fn run_status(&self, src: &str) -> bool;

    /// Run a script, capturing its output lines; `None` on failure
    fn run_lines(&self, src: &str) -> Option<Vec<String>>;

    /// Evaluate a definition file in the current shell
    fn source_file(&self, path: &Path) -> bool;

    /// Evaluate an argument list into words. With `safe` set the
    /// evaluator must not execute anything; words that would require
    /// execution are dropped.
    fn eval_args(&self, src: &str, safe: bool) -> Vec<String> {
        let _ = safe;
        split_arg_spec(src)
    }
}

/// Word-split an argument specification without executing anything.
///
/// Quoting and escaping are honored; words containing command
/// substitutions are dropped since they cannot be evaluated here.
pub fn split_arg_spec(src: &str) -> Vec<String> {
    Tokenizer::tokenize(src)
        .into_iter()
        .filter_map(|t| match t.kind {
            TokenKind::Word(raw) => {
                if raw.contains("$(") {
                    return None;
                }
                escape::unescape_string(&raw, true)
            }
            _ => None,
        })
        .collect()
}

/// Subshell executor that never executes anything
#[derive(Debug, Default)]
pub struct NullSubshell;

impl SubshellExecutor for NullSubshell {
    fn run_status(&self, src: &str) -> bool {
        debug!(script = src, "subshell execution unavailable");
        false
    }

    fn run_lines(&self, _src: &str) -> Option<Vec<String>> {
        None
    }

    fn source_file(&self, path: &Path) -> bool {
        debug!(path = %path.display(), "cannot source file without an interpreter");
        false
    }
}

/// One password database entry
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub name: String,
    pub home: PathBuf,
}

/// Password database seam
pub trait UserDatabase: Send + Sync {
    /// Iterate entries lazily; enumeration may be slow, so callers can
    /// stop early
    fn entries(&self) -> Box<dyn Iterator<Item = UserEntry> + '_>;
}

/// Password database reading `/etc/passwd`
#[derive(Debug, Default)]
pub struct SystemUserDb;

impl UserDatabase for SystemUserDb {
    fn entries(&self) -> Box<dyn Iterator<Item = UserEntry> + '_> {
        let Ok(file) = File::open("/etc/passwd") else {
            return Box::new(std::iter::empty());
        };
        let iter = BufReader::new(file).lines().filter_map(|line| {
            let line = line.ok()?;
            let mut fields = line.split(':');
            let name = fields.next()?.to_string();
            if name.is_empty() || name.starts_with('#') {
                return None;
            }
            let home = fields.nth(4).unwrap_or("/").to_string();
            Some(UserEntry {
                name,
                home: PathBuf::from(home),
            })
        });
        Box::new(iter)
    }
}

/// Password database over a fixed entry list
#[derive(Debug, Default)]
pub struct StaticUserDb {
    entries: Vec<UserEntry>,
}

impl StaticUserDb {
    pub fn with_users<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: names
                .into_iter()
                .map(|n| {
                    let name = n.into();
                    let home = PathBuf::from(format!("/home/{}", name));
                    UserEntry { name, home }
                })
                .collect(),
        }
    }
}

impl UserDatabase for StaticUserDb {
    fn entries(&self) -> Box<dyn Iterator<Item = UserEntry> + '_> {
        Box::new(self.entries.iter().cloned())
    }
}

/// Queue for work that must run on the shell's main thread.
///
/// Autosuggestion runs on worker threads and is not allowed to load
/// completion definitions itself; it posts a request here instead.
pub trait MainThreadQueue: Send + Sync {
    /// Request that completions for `cmd` be loaded on the main thread
    fn post_completion_load(&self, cmd: &str);
}

/// Queue that drops every request
#[derive(Debug, Default)]
pub struct DiscardQueue;

impl MainThreadQueue for DiscardQueue {
    fn post_completion_load(&self, _cmd: &str) {}
}

/// Channel-backed queue; the embedding shell drains the receiver from
/// its main loop
#[derive(Debug)]
pub struct ChannelQueue {
    tx: Mutex<Sender<String>>,
}

impl ChannelQueue {
    /// Create a queue and the receiver to drain it with
    pub fn channel() -> (Self, Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl MainThreadQueue for ChannelQueue {
    fn post_completion_load(&self, cmd: &str) {
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(cmd.to_string());
        }
    }
}

/// The bundle of collaborators a completion session works against
#[derive(Clone)]
pub struct Host {
    pub expander: Arc<dyn Expander>,
    pub env: Arc<dyn EnvProvider>,
    pub functions: Arc<dyn FunctionRegistry>,
    pub builtins: Arc<dyn BuiltinRegistry>,
    pub subshell: Arc<dyn SubshellExecutor>,
    pub users: Arc<dyn UserDatabase>,
    pub main_thread: Arc<dyn MainThreadQueue>,
}

impl Host {
    /// A host wired to the real file system and process environment,
    /// with no interpreter attached
    pub fn with_defaults() -> Self {
        Self {
            expander: Arc::new(FilesystemExpander::new()),
            env: Arc::new(ProcessEnv),
            functions: Arc::new(StaticRegistry::new()),
            builtins: Arc::new(default_builtins()),
            subshell: Arc::new(NullSubshell),
            users: Arc::new(SystemUserDb),
            main_thread: Arc::new(DiscardQueue),
        }
    }

    /// Resolve a command name against `PATH`.
    ///
    /// Returns the absolute path of the first matching executable, or
    /// `None`. Words containing a slash resolve relative to the file
    /// system directly.
    pub fn resolve_command_path(&self, cmd: &str) -> Option<PathBuf> {
        if cmd.is_empty() {
            return None;
        }
        if cmd.contains('/') {
            let path = PathBuf::from(cmd);
            return path.is_file().then_some(path);
        }
        let path_var = self.env.get("PATH")?;
        for dir in path_var.split(':').filter(|d| !d.is_empty()) {
            let candidate = Path::new(dir).join(cmd);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}
