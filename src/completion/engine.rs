//! Completion engine - the public face of the completion subsystem
//!
//! The engine owns the schema store, the autoloader, and the host
//! seams, and hands out one [`Completer`] session per request. It is
//! safe to share across threads; autosuggestion workers call
//! [`CompletionEngine::complete`] with the autosuggestion flag set.

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::autoload::Autoloader;
use super::candidate::{CompleteFlags, Completion};
use super::printer;
use super::session::{Completer, CompletionRequestFlags};
use super::store::{CompletionStore, ResultMode};
use super::validate;
use crate::config::CompletionConfig;
use crate::host::Host;

/// Main completion engine
pub struct CompletionEngine {
    store: CompletionStore,
    autoloader: Mutex<Autoloader>,
    host: Arc<Host>,
    config: CompletionConfig,
    /// Testing hook: overrides the environment for variable completion
    variable_override: Mutex<Option<Vec<String>>>,
}

impl CompletionEngine {
    /// Create an engine with default configuration
    pub fn new(host: Arc<Host>) -> Self {
        Self::with_config(host, CompletionConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(host: Arc<Host>, config: CompletionConfig) -> Self {
        Self {
            store: CompletionStore::new(),
            autoloader: Mutex::new(Autoloader::new(config.autoload_path_var.clone())),
            host,
            config,
            variable_override: Mutex::new(None),
        }
    }

    /// Compute completions for `line`, with the cursor at its end
    pub fn complete(&self, line: &str, flags: CompletionRequestFlags) -> Vec<Completion> {
        let mut completer = Completer::new(self, flags);
        completer.run(line);
        completer.into_completions()
    }

    /// Declare an option for `cmd`
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
    ) {
        self.add_with_flags(
            cmd,
            cmd_is_path,
            short_opt,
            long_opt,
            old_mode,
            result_mode,
            condition,
            arg_spec,
            desc,
            CompleteFlags::empty(),
        );
    }

    /// Declare an option for `cmd`, with explicit candidate flags
    #[allow(clippy::too_many_arguments)]
    pub fn add_with_flags(
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
        self.store.add(
            cmd,
            cmd_is_path,
            short_opt,
            long_opt,
            old_mode,
            result_mode,
            condition,
            arg_spec,
            desc,
            flags,
        );
    }

    /// Remove options from a command's schema; with both identifiers
    /// absent, remove them all
    pub fn remove(
        &self,
        cmd: &str,
        cmd_is_path: bool,
        short_opt: Option<char>,
        long_opt: Option<&str>,
    ) {
        self.store.remove(cmd, cmd_is_path, short_opt, long_opt);
    }

    /// Declare a command's option set exhaustive (or not)
    pub fn set_authoritative(&self, cmd: &str, cmd_is_path: bool, authoritative: bool) {
        self.store.set_authoritative(cmd, cmd_is_path, authoritative);
    }

    /// Validate a typed option against the store
    pub fn is_valid_option(
        &self,
        cmd: &str,
        opt: &str,
        errors: Option<&mut Vec<String>>,
        allow_autoload: bool,
    ) -> bool {
        validate::is_valid_option(self, cmd, opt, errors, allow_autoload)
    }

    /// Serialize the store as replayable `complete` commands
    pub fn print(&self) -> String {
        printer::print(&self.store)
    }

    /// Replay one printed line into the store. Returns whether the
    /// line parsed.
    pub fn replay_line(&self, line: &str) -> bool {
        printer::replay_line(&self.store, line)
    }

    /// Load completion definitions for `name` from the search path
    pub fn load(&self, name: &str, reload: bool) {
        // A definition file may itself trigger engine calls while it is
        // sourced; a re-entrant load is skipped rather than deadlocked.
        match self.autoloader.try_lock() {
            Ok(mut loader) => {
                loader.load(name, reload, &self.host, &self.store);
            }
            Err(_) => {
                debug!(name, "re-entrant completion load skipped");
            }
        }
    }

    /// Whether an autoload was ever attempted for `cmd`
    pub fn has_tried_loading(&self, cmd: &str) -> bool {
        self.autoloader
            .try_lock()
            .map(|loader| loader.has_tried(cmd))
            .unwrap_or(true)
    }

    /// Testing hook: override the variable names visible to variable
    /// completion. `None` restores the environment.
    pub fn set_variable_names(&self, names: Option<Vec<String>>) {
        *self.variable_override.lock().unwrap() = names;
    }

    /// The variable names visible to variable completion
    pub(crate) fn variable_names(&self) -> Vec<String> {
        if let Some(names) = self.variable_override.lock().unwrap().as_ref() {
            return names.clone();
        }
        self.host.env.names()
    }

    /// Split a command word into its bare name and resolved path (empty
    /// when the command cannot be found)
    pub(crate) fn resolve_cmd(&self, cmd: &str) -> (String, String) {
        let name = match cmd.rfind('/') {
            Some(idx) => cmd[idx + 1..].to_string(),
            None => cmd.to_string(),
        };
        let path = self
            .host
            .resolve_command_path(cmd)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        (name, path)
    }

    pub(crate) fn store(&self) -> &CompletionStore {
        &self.store
    }

    pub(crate) fn host(&self) -> &Arc<Host> {
        &self.host
    }

    pub(crate) fn config(&self) -> &CompletionConfig {
        &self.config
    }
}
