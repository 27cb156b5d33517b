//! Wildcard and path expansion
//!
//! The completion engine delegates file-system expansion to an
//! [`Expander`]. The default implementation completes the last path
//! component against the directory it lives in, which is what
//! `ACCEPT_INCOMPLETE` means: the input is a partially typed word, not
//! a finished pattern.

use std::path::{Path, PathBuf};

use bitflags::bitflags;
use tracing::debug;

use crate::completion::{append_completion, CompleteFlags, Completion};
use crate::completion::{fuzzy_match, FuzzyMatchKind};
use crate::utils::{escape, wildcard};

bitflags! {
    /// Behavior flags for [`Expander::expand`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExpandFlags: u8 {
        /// Never run command substitutions found in the input
        const SKIP_CMDSUBST = 1 << 0;
        /// The input is a partially typed word; complete its last
        /// component instead of requiring a full match
        const ACCEPT_INCOMPLETE = 1 << 1;
        /// Treat wildcard characters as literals
        const SKIP_WILDCARDS = 1 << 2;
        /// Do not attach file descriptions to candidates
        const NO_DESCRIPTIONS = 1 << 3;
        /// Allow fuzzy match kinds beyond prefix matching
        const FUZZY_MATCH = 1 << 4;
        /// Only produce executables (and directories, which may lead
        /// to them)
        const EXECUTABLES_ONLY = 1 << 5;
    }
}

/// Outcome of an expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandResult {
    /// Expansion ran; candidates (possibly none) were appended
    Ok,
    /// Expansion failed; the candidate list is unchanged
    Error,
}

/// File-system expansion seam used by the completion engine
pub trait Expander: Send + Sync {
    /// Expand `input`, appending candidates to `out`
    fn expand(&self, input: &str, out: &mut Vec<Completion>, flags: ExpandFlags) -> ExpandResult;
}

/// Expander over the real file system
#[derive(Debug, Default)]
pub struct FilesystemExpander;

impl FilesystemExpander {
    pub fn new() -> Self {
        Self
    }
}

impl Expander for FilesystemExpander {
    fn expand(&self, input: &str, out: &mut Vec<Completion>, flags: ExpandFlags) -> ExpandResult {
        let Some(literal) = escape::unescape_string(input, true) else {
            return ExpandResult::Error;
        };

        // Command substitutions cannot be evaluated here; with
        // SKIP_CMDSUBST the word is simply not completable.
        if literal.contains("$(") {
            if flags.contains(ExpandFlags::SKIP_CMDSUBST) {
                return ExpandResult::Ok;
            }
            return ExpandResult::Error;
        }

        let (dir_part, partial) = split_last_component(&literal);
        let search_dir = resolve_dir(&dir_part);

        let entries = match std::fs::read_dir(&search_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %search_dir.display(), error = %e, "directory not readable");
                // A missing directory is not an error for an
                // in-progress word; there is just nothing to offer.
                return ExpandResult::Ok;
            }
        };

        let use_wildcards =
            !flags.contains(ExpandFlags::SKIP_WILDCARDS) && wildcard::has_wildcard(&partial);
        let pattern = if use_wildcards {
            match glob::Pattern::new(&format!("{}*", partial)) {
                Ok(p) => Some(p),
                Err(e) => {
                    debug!(pattern = %partial, error = %e, "bad wildcard pattern");
                    return ExpandResult::Error;
                }
            }
        } else {
            None
        };

        let limit = if flags.contains(ExpandFlags::FUZZY_MATCH) {
            FuzzyMatchKind::Subsequence
        } else {
            FuzzyMatchKind::PrefixCaseInsensitive
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();

            // Hidden entries only appear once the user asks for them
            if name.starts_with('.') && !partial.starts_with('.') {
                continue;
            }

            let file_type = entry.file_type().ok();
            let is_dir = file_type.map(|t| t.is_dir()).unwrap_or(false);

            if flags.contains(ExpandFlags::EXECUTABLES_ONLY)
                && !is_dir
                && !is_executable(&entry.path())
            {
                continue;
            }

            let description = if flags.contains(ExpandFlags::NO_DESCRIPTIONS) {
                ""
            } else if is_dir {
                "Directory"
            } else if flags.contains(ExpandFlags::EXECUTABLES_ONLY) || is_executable(&entry.path())
            {
                "Executable"
            } else {
                "File"
            };

            let suffix = if is_dir { "/" } else { "" };

            if let Some(pattern) = &pattern {
                if pattern.matches(&name) {
                    let text = format!("{}{}{}", dir_part, name, suffix);
                    append_completion(
                        out,
                        text,
                        description,
                        CompleteFlags::REPLACES_TOKEN | CompleteFlags::AUTO_SPACE,
                        fuzzy_match(&partial, &name, FuzzyMatchKind::Subsequence),
                    );
                }
                continue;
            }

            let m = fuzzy_match(&partial, &name, limit);
            if m.is_none() {
                continue;
            }

            if !m.requires_full_replacement() {
                let rest: String = name.chars().skip(partial.chars().count()).collect();
                append_completion(
                    out,
                    format!("{}{}", rest, suffix),
                    description,
                    CompleteFlags::AUTO_SPACE,
                    m,
                );
            } else {
                append_completion(
                    out,
                    format!("{}{}{}", dir_part, name, suffix),
                    description,
                    CompleteFlags::REPLACES_TOKEN | CompleteFlags::AUTO_SPACE,
                    m,
                );
            }
        }

        ExpandResult::Ok
    }
}

/// Split a word into its directory part (kept verbatim, including the
/// trailing slash) and the partial last component being completed
fn split_last_component(literal: &str) -> (String, String) {
    match literal.rfind('/') {
        Some(idx) => (literal[..=idx].to_string(), literal[idx + 1..].to_string()),
        None => (String::new(), literal.to_string()),
    }
}

/// Resolve the directory to enumerate for a given directory part,
/// expanding a leading `~`
fn resolve_dir(dir_part: &str) -> PathBuf {
    if dir_part.is_empty() {
        return PathBuf::from(".");
    }
    if dir_part == "~/" || dir_part == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    }
    if let Some(rest) = dir_part.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(dir_part)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
