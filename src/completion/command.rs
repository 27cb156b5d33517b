//! Command-name completion
//!
//! Completes the command word of a statement from three sources: path
//! lookup (including per-`PATH`-element expansion), shell functions,
//! and builtins. Descriptions for path results come from an external
//! description helper executed as a subshell.

use std::collections::HashMap;

use tracing::debug;

use super::candidate::CompleteFlags;
use super::session::Completer;
use crate::expand::{ExpandFlags, ExpandResult};
use crate::utils::{escape, string, wildcard};

impl Completer<'_> {
    /// Complete the command word `str_cmd` (raw token text). The three
    /// `use_*` switches come from the statement decoration.
    pub(crate) fn complete_cmd(
        &mut self,
        str_cmd: &str,
        use_function: bool,
        use_builtin: bool,
        use_command: bool,
    ) {
        if str_cmd.is_empty() {
            return;
        }

        // Implicit-cd completion reads CDPATH; an empty value means the
        // current directory only.
        let _cdpath = self
            .engine
            .host()
            .env
            .get("CDPATH")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| ".".to_string());

        if use_command {
            let flags = ExpandFlags::ACCEPT_INCOMPLETE
                | ExpandFlags::EXECUTABLES_ONLY
                | self.expand_flags();
            if self.expand_into_completions(str_cmd, flags) != ExpandResult::Error
                && self.wants_descriptions()
            {
                self.complete_cmd_desc(str_cmd);
            }
        }

        if str_cmd.contains('/') || str_cmd.starts_with('~') {
            return;
        }

        if use_command {
            if let Some(path_var) = self.engine.host().env.get("PATH") {
                for base in path_var.split(':').filter(|p| !p.is_empty()) {
                    let mut base = base.to_string();
                    if !base.ends_with('/') {
                        base.push('/');
                    }

                    let next_completion = format!("{}{}", base, str_cmd);
                    let prev_count = self.completions().len();
                    let flags = ExpandFlags::ACCEPT_INCOMPLETE
                        | ExpandFlags::EXECUTABLES_ONLY
                        | self.expand_flags();
                    if self.expand_into_completions(&next_completion, flags)
                        != ExpandResult::Error
                    {
                        // Replacement candidates carry the whole path;
                        // strip the PATH element so only the command
                        // name is offered
                        for c in self.completions_mut()[prev_count..].iter_mut() {
                            if c.flags.contains(CompleteFlags::REPLACES_TOKEN)
                                && c.text.starts_with(&base)
                            {
                                c.text.drain(..base.len());
                            }
                        }
                    }
                }
                if self.wants_descriptions() {
                    self.complete_cmd_desc(str_cmd);
                }
            }
        }

        let Some(pattern) = escape::unescape_string(str_cmd, true) else {
            return;
        };

        if use_function {
            let include_hidden = str_cmd.starts_with('_');
            let names = self.engine.host().functions.names(include_hidden);
            let host = self.engine.host().clone();
            let desc_fn = move |name: &str| -> String {
                host.functions
                    .description(name)
                    .or_else(|| host.functions.definition(name))
                    .unwrap_or_default()
            };
            self.complete_strings(&pattern, "", Some(&desc_fn), &names, CompleteFlags::empty());
        }

        if use_builtin {
            let names = self.engine.host().builtins.names();
            let host = self.engine.host().clone();
            let desc_fn =
                move |name: &str| -> String { host.builtins.description(name).unwrap_or_default() };
            self.complete_strings(&pattern, "", Some(&desc_fn), &names, CompleteFlags::empty());
        }
    }

    /// Replace descriptions of current candidates with the output of
    /// the shell's command description helper.
    ///
    /// Skipped for very short or wildcard-bearing tokens (the lookup is
    /// expensive and noisy), and when every candidate is a directory.
    pub(crate) fn complete_cmd_desc(&mut self, str_cmd: &str) {
        if self.is_autosuggest() {
            return;
        }

        let cmd_start = match str_cmd.rfind('/') {
            Some(idx) => &str_cmd[idx + 1..],
            None => str_cmd,
        };

        if cmd_start.chars().count() < self.engine.config().description_min_token_len {
            return;
        }

        if wildcard::has_wildcard(cmd_start) {
            return;
        }

        if self
            .completions()
            .iter()
            .all(|c| !c.text.is_empty() && c.text.ends_with('/'))
        {
            return;
        }

        let lookup_cmd = format!(
            "__nacre_describe_command {}",
            escape::escape_string(cmd_start)
        );

        let Some(lines) = self.engine.host().subshell.run_lines(&lookup_cmd) else {
            debug!(cmd = cmd_start, "command description lookup failed");
            return;
        };

        // Lines come back as "<typed prefix><rest>\t<description>";
        // stripping the prefix leaves exactly the suffix-style
        // candidate texts produced by path completion.
        let prefix_len = cmd_start.len();
        let mut lookup: HashMap<String, String> = HashMap::new();
        for line in lines {
            let Some(keyed) = line.get(prefix_len..) else {
                continue;
            };
            let Some(tab_idx) = keyed.find('\t') else {
                continue;
            };
            let key = keyed[..tab_idx].to_string();
            let value = string::uppercase_first(&keyed[tab_idx + 1..]);
            lookup.insert(key, value);
        }

        for c in self.completions_mut().iter_mut() {
            if c.text.is_empty() {
                continue;
            }
            if let Some(desc) = lookup.get(&c.text) {
                c.description = desc.clone();
            }
        }
    }
}
