//! `~user` completion
//!
//! Enumerating the password database can be slow on systems with
//! networked user directories, so the scan self-terminates after a
//! configured wall-clock budget (200 ms by default).

use std::time::{Duration, Instant};

use super::candidate::CompleteFlags;
use super::session::Completer;

impl Completer<'_> {
    /// Try to complete `token` as a `~user` reference. Returns whether
    /// any candidate was produced (or the scan timed out).
    pub(crate) fn try_complete_user(&mut self, token: &str) -> bool {
        let Some(user_name) = token.strip_prefix('~') else {
            return false;
        };
        if token.contains('/') || user_name.contains('~') {
            return false;
        }

        let budget = Duration::from_millis(self.engine.config().user_scan_budget_ms);
        let start_time = Instant::now();

        let host = self.engine.host().clone();
        let mut res = false;

        for entry in host.users.entries() {
            if start_time.elapsed() > budget {
                return true;
            }

            if entry.name.starts_with(user_name) {
                let suffix: String = entry
                    .name
                    .chars()
                    .skip(user_name.chars().count())
                    .collect();
                let desc = format!("Home for {}", entry.name);
                self.append(
                    suffix,
                    desc,
                    CompleteFlags::NO_SPACE,
                    crate::completion::FuzzyMatch::exact(),
                );
                res = true;
            } else if starts_with_insensitive(&entry.name, user_name) {
                let desc = format!("Home for {}", entry.name);
                self.append(
                    format!("~{}", entry.name),
                    desc,
                    CompleteFlags::REPLACES_TOKEN
                        | CompleteFlags::DONT_ESCAPE
                        | CompleteFlags::NO_SPACE,
                    crate::completion::FuzzyMatch::exact(),
                );
                res = true;
            }
        }

        res
    }
}

fn starts_with_insensitive(name: &str, prefix: &str) -> bool {
    crate::utils::string::prefixes_insensitive(prefix, name)
}
