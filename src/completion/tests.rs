//! End-to-end completion scenarios against a scripted host

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::*;
use crate::expand::{ExpandFlags, ExpandResult, Expander};
use crate::host::{
    ChannelQueue, EnvProvider, Host, StaticRegistry, StaticUserDb, SubshellExecutor,
};

struct TestEnv(HashMap<String, String>);

impl TestEnv {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl EnvProvider for TestEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Subshell that records every script it is asked to run
#[derive(Default)]
struct RecordingSubshell {
    statuses: HashMap<String, bool>,
    lines: HashMap<String, Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl RecordingSubshell {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SubshellExecutor for RecordingSubshell {
    fn run_status(&self, src: &str) -> bool {
        self.calls.lock().unwrap().push(src.to_string());
        self.statuses.get(src).copied().unwrap_or(false)
    }
    fn run_lines(&self, src: &str) -> Option<Vec<String>> {
        self.calls.lock().unwrap().push(src.to_string());
        self.lines.get(src).cloned()
    }
    fn source_file(&self, _path: &Path) -> bool {
        false
    }
}

/// Expander that produces nothing, keeping scenarios deterministic
struct NullExpander;

impl Expander for NullExpander {
    fn expand(&self, _input: &str, _out: &mut Vec<Completion>, _flags: ExpandFlags) -> ExpandResult {
        ExpandResult::Ok
    }
}

fn test_host() -> Host {
    let mut host = Host::with_defaults();
    host.expander = Arc::new(NullExpander);
    host.env = Arc::new(TestEnv::new(&[("HOME", "/home/tester")]));
    host.users = Arc::new(StaticUserDb::with_users(["alice", "bob"]));
    host.subshell = Arc::new(RecordingSubshell::default());
    host
}

fn engine_with(host: Host) -> CompletionEngine {
    CompletionEngine::new(Arc::new(host))
}

/// The line a token becomes when a candidate is accepted
fn applied(token: &str, c: &Completion) -> String {
    if c.flags.contains(CompleteFlags::REPLACES_TOKEN) {
        c.text.clone()
    } else {
        format!("{}{}", token, c.text)
    }
}

fn add_branch_option(engine: &CompletionEngine) {
    engine.add(
        "git",
        false,
        Some('b'),
        "branch",
        false,
        ResultMode::NO_COMMON,
        "",
        "master develop",
        "Branch to use",
    );
}

#[test]
fn test_short_flag_completion() {
    let engine = engine_with(test_host());
    add_branch_option(&engine);

    let comps = engine.complete("git -", CompletionRequestFlags::DESCRIPTIONS);
    let short = comps.iter().find(|c| c.text == "b").expect("no -b candidate");
    assert_eq!(short.description, "Branch to use");
}

#[test]
fn test_long_flag_offered_from_dash() {
    let engine = engine_with(test_host());
    add_branch_option(&engine);

    let comps = engine.complete("git -", CompletionRequestFlags::DESCRIPTIONS);
    assert!(comps.iter().any(|c| applied("-", c) == "-branch" || applied("-", c) == "--branch"));
}

#[test]
fn test_gnu_long_flag_value() {
    let engine = engine_with(test_host());
    add_branch_option(&engine);

    let comps = engine.complete("git --branch=m", CompletionRequestFlags::DESCRIPTIONS);
    // The value part completes to "master"; the candidate must not
    // rebuild the whole token
    let value = comps
        .iter()
        .find(|c| applied("m", c) == "master")
        .expect("no master candidate");
    assert_eq!(value.description, "Branch to use");
    assert!(!comps.iter().any(|c| c.text.contains("--branch=")));
    assert!(!comps.iter().any(|c| applied("m", c) == "develop"));
}

#[test]
fn test_switch_argument_after_separate_token() {
    let engine = engine_with(test_host());
    add_branch_option(&engine);

    // -b consumes the next token, so its arguments complete there
    let comps = engine.complete("git -b ma", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("ma", c) == "master"));
}

#[test]
fn test_optional_argument_double_emission() {
    let engine = engine_with(test_host());
    engine.add(
        "git",
        false,
        None,
        "color",
        false,
        ResultMode::empty(),
        "",
        "auto never",
        "Colorize output",
    );

    let comps = engine.complete("git --col", CompletionRequestFlags::empty());
    let texts: Vec<String> = comps.iter().map(|c| applied("--col", c)).collect();
    assert!(texts.contains(&"--color".to_string()), "{:?}", texts);
    assert!(texts.contains(&"--color=".to_string()), "{:?}", texts);

    // The '=' spelling suppresses the trailing space
    let eq = comps
        .iter()
        .find(|c| applied("--col", c) == "--color=")
        .unwrap();
    assert!(eq.flags.contains(CompleteFlags::NO_SPACE));
}

#[test]
fn test_gnu_optional_argument_not_consumed_from_previous_token() {
    let engine = engine_with(test_host());
    engine.add(
        "git",
        false,
        None,
        "color",
        false,
        ResultMode::empty(),
        "",
        "auto never",
        "",
    );

    // `--color auto` is not a thing for optional arguments; the value
    // must come via '='
    let comps = engine.complete("git --color a", CompletionRequestFlags::empty());
    assert!(!comps.iter().any(|c| applied("a", c) == "auto"));
}

#[test]
fn test_variable_in_double_quotes() {
    let engine = engine_with(test_host());
    engine.set_variable_names(Some(vec!["HOME".to_string(), "PWD".to_string()]));

    let comps = engine.complete("\"$HO", CompletionRequestFlags::DESCRIPTIONS);
    let hit = comps.iter().find(|c| c.text == "ME").expect("no ME suffix");
    assert_eq!(hit.description, "Variable: /home/tester");
}

#[test]
fn test_variable_not_completed_in_single_quotes() {
    let engine = engine_with(test_host());
    engine.set_variable_names(Some(vec!["HOME".to_string()]));

    let comps = engine.complete("'$HO", CompletionRequestFlags::empty());
    assert!(!comps.iter().any(|c| c.text == "ME"));
}

#[test]
fn test_variable_case_fold_replaces_token() {
    let engine = engine_with(test_host());
    engine.set_variable_names(Some(vec!["HOME".to_string()]));

    let comps = engine.complete("$ho", CompletionRequestFlags::empty());
    let hit = comps.iter().find(|c| c.text == "$HOME").expect("no $HOME");
    assert!(hit.flags.contains(CompleteFlags::REPLACES_TOKEN));
    assert!(hit.flags.contains(CompleteFlags::DONT_ESCAPE));
}

#[test]
fn test_user_tilde_suffix() {
    let engine = engine_with(test_host());

    let comps = engine.complete("~al", CompletionRequestFlags::empty());
    let hit = comps.iter().find(|c| c.text == "ice").expect("no ice suffix");
    assert!(hit.flags.contains(CompleteFlags::NO_SPACE));
    assert_eq!(hit.description, "Home for alice");
}

#[test]
fn test_user_tilde_case_insensitive_replaces() {
    let engine = engine_with(test_host());

    let comps = engine.complete("~AL", CompletionRequestFlags::empty());
    let hit = comps.iter().find(|c| c.text == "~alice").expect("no ~alice");
    assert!(hit.flags.contains(CompleteFlags::REPLACES_TOKEN));
    assert!(hit.flags.contains(CompleteFlags::DONT_ESCAPE));
    assert!(hit.flags.contains(CompleteFlags::NO_SPACE));
}

#[test]
fn test_user_tilde_with_slash_is_a_path() {
    let engine = engine_with(test_host());
    let comps = engine.complete("~alice/", CompletionRequestFlags::empty());
    assert!(!comps.iter().any(|c| c.description.starts_with("Home for")));
}

#[test]
fn test_authoritative_rejection_scenario() {
    let engine = engine_with(test_host());
    engine.set_authoritative("foo", false, true);

    let mut errors = Vec::new();
    assert!(!engine.is_valid_option("foo", "-x", Some(&mut errors), false));
    assert!(errors[0].starts_with("Unknown option: "));
}

#[test]
fn test_condition_memoization() {
    let mut host = test_host();
    let subshell = Arc::new(RecordingSubshell {
        statuses: HashMap::from([("test -d .git".to_string(), true)]),
        ..Default::default()
    });
    host.subshell = subshell.clone();
    let engine = engine_with(host);

    // Two distinct options sharing one condition source
    engine.add(
        "git",
        false,
        Some('a'),
        "all",
        false,
        ResultMode::empty(),
        "test -d .git",
        "",
        "",
    );
    engine.add(
        "git",
        false,
        Some('b'),
        "branch",
        false,
        ResultMode::empty(),
        "test -d .git",
        "",
        "",
    );

    let comps = engine.complete("git -", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| c.text == "a"));
    assert!(comps.iter().any(|c| c.text == "b"));
    assert_eq!(subshell.call_count(), 1, "condition evaluated more than once");
}

#[test]
fn test_condition_cache_not_shared_between_sessions() {
    let mut host = test_host();
    let subshell = Arc::new(RecordingSubshell {
        statuses: HashMap::from([("test -d .git".to_string(), true)]),
        ..Default::default()
    });
    host.subshell = subshell.clone();
    let engine = engine_with(host);

    engine.add(
        "git",
        false,
        Some('a'),
        "all",
        false,
        ResultMode::empty(),
        "test -d .git",
        "",
        "",
    );

    engine.complete("git -", CompletionRequestFlags::empty());
    engine.complete("git -", CompletionRequestFlags::empty());
    assert_eq!(subshell.call_count(), 2);
}

#[test]
fn test_failing_condition_suppresses_option() {
    let engine = engine_with(test_host());
    engine.add(
        "git",
        false,
        Some('a'),
        "all",
        false,
        ResultMode::empty(),
        "false",
        "",
        "",
    );

    let comps = engine.complete("git -", CompletionRequestFlags::empty());
    assert!(!comps.iter().any(|c| c.text == "a"));
}

#[test]
fn test_autosuggest_never_runs_subshells() {
    let mut host = test_host();
    let subshell = Arc::new(RecordingSubshell {
        statuses: HashMap::from([("true".to_string(), true)]),
        ..Default::default()
    });
    host.subshell = subshell.clone();
    let engine = engine_with(host);

    engine.add(
        "git",
        false,
        Some('a'),
        "all",
        false,
        ResultMode::empty(),
        "true",
        "",
        "",
    );
    engine.add(
        "git",
        false,
        Some('b'),
        "branch",
        false,
        ResultMode::empty(),
        "",
        "",
        "",
    );

    let comps = engine.complete(
        "git -",
        CompletionRequestFlags::AUTOSUGGESTION | CompletionRequestFlags::DESCRIPTIONS,
    );
    assert_eq!(subshell.call_count(), 0);
    // Conditions fail closed off-thread
    assert!(!comps.iter().any(|c| c.text == "a"));
    assert!(comps.iter().any(|c| c.text == "b"));
}

#[test]
fn test_autosuggest_posts_load_request_to_main_thread() {
    let (queue, rx) = ChannelQueue::channel();
    let mut host = test_host();
    host.main_thread = Arc::new(queue);
    let engine = engine_with(host);

    engine.complete("git chec", CompletionRequestFlags::AUTOSUGGESTION);
    assert_eq!(rx.try_recv().unwrap(), "git");
}

#[test]
fn test_engine_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompletionEngine>();

    let engine = Arc::new(engine_with(test_host()));
    add_branch_option(&engine);

    let worker = {
        let engine = engine.clone();
        std::thread::spawn(move || engine.complete("git -", CompletionRequestFlags::AUTOSUGGESTION))
    };
    let comps = worker.join().unwrap();
    assert!(comps.iter().any(|c| c.text == "b"));
}

#[test]
fn test_double_dash_disables_switches() {
    let engine = engine_with(test_host());
    add_branch_option(&engine);

    let comps = engine.complete("git -- -", CompletionRequestFlags::empty());
    assert!(!comps.iter().any(|c| c.text == "b"));
}

#[test]
fn test_builtin_completion() {
    let engine = engine_with(test_host());
    let comps = engine.complete("ec", CompletionRequestFlags::DESCRIPTIONS);
    let hit = comps.iter().find(|c| applied("ec", c) == "echo").expect("no echo");
    assert_eq!(hit.description, "Write arguments to standard output");
}

#[test]
fn test_builtin_decoration_restricts_sources() {
    let mut host = test_host();
    host.functions = Arc::new(StaticRegistry::with_entries([("echoish", "A function")]));
    let engine = engine_with(host);

    // Undecorated: both the builtin and the function appear
    let comps = engine.complete("ec", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("ec", c) == "echo"));
    assert!(comps.iter().any(|c| applied("ec", c) == "echoish"));

    // builtin decoration: only builtins
    let comps = engine.complete("builtin ec", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("ec", c) == "echo"));
    assert!(!comps.iter().any(|c| applied("ec", c) == "echoish"));
}

#[test]
fn test_hidden_functions_need_underscore() {
    let mut host = test_host();
    host.functions = Arc::new(StaticRegistry::with_entries([
        ("_internal", "Hidden"),
        ("visible", "Shown"),
    ]));
    let engine = engine_with(host);

    let comps = engine.complete("vi", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("vi", c) == "visible"));
    assert!(!comps.iter().any(|c| applied("vi", c) == "_internal"));

    let comps = engine.complete("_i", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("_i", c) == "_internal"));
}

#[test]
fn test_positional_arguments_from_schema() {
    let engine = engine_with(test_host());
    engine.add(
        "systemctl",
        false,
        None,
        "",
        false,
        ResultMode::NO_FILES,
        "",
        "start stop restart",
        "Subcommand",
    );

    let comps = engine.complete("systemctl st", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("st", c) == "start"));
    assert!(comps.iter().any(|c| applied("st", c) == "stop"));
    assert!(!comps.iter().any(|c| applied("st", c) == "restart"));
}

#[test]
fn test_newest_option_wins_ordering() {
    let engine = engine_with(test_host());
    engine.add("git", false, Some('a'), "", false, ResultMode::empty(), "", "", "first");
    engine.add("git", false, Some('b'), "", false, ResultMode::empty(), "", "", "second");

    let comps = engine.complete("git -", CompletionRequestFlags::DESCRIPTIONS);
    let a_pos = comps.iter().position(|c| c.text == "a").unwrap();
    let b_pos = comps.iter().position(|c| c.text == "b").unwrap();
    // Options are inserted at the head: the most recently added rule
    // comes out first
    assert!(b_pos < a_pos);
}

#[test]
fn test_auto_space_never_observable() {
    let engine = engine_with(test_host());
    add_branch_option(&engine);
    engine.set_variable_names(Some(vec!["HOME".to_string()]));

    for line in ["git -", "git --branch=m", "\"$HO", "~al", "ec"] {
        for c in engine.complete(line, CompletionRequestFlags::DESCRIPTIONS) {
            assert!(
                !c.flags.contains(CompleteFlags::AUTO_SPACE),
                "AUTO_SPACE leaked from {:?}",
                line
            );
        }
    }
}

#[test]
fn test_empty_line_yields_no_candidates() {
    let engine = engine_with(test_host());
    let comps = engine.complete("", CompletionRequestFlags::empty());
    assert!(comps.is_empty());
}

#[test]
fn test_completion_inside_command_substitution() {
    let engine = engine_with(test_host());
    add_branch_option(&engine);

    // The engine completes the inner command, not `echo`
    let comps = engine.complete("echo $(git -", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| c.text == "b"));
}

#[test]
fn test_path_schema_requires_resolved_path() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("deploy");
    std::fs::write(&exe, b"#!/bin/sh\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&exe).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&exe, perms).unwrap();
    }

    let engine = engine_with(test_host());
    engine.add(
        &exe.display().to_string(),
        true,
        Some('v'),
        "",
        false,
        ResultMode::empty(),
        "",
        "",
        "Verbose",
    );

    let line = format!("{} -", exe.display());
    let comps = engine.complete(&line, CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| c.text == "v"));

    // The bare name does not resolve to that path, so the schema stays
    // silent
    let comps = engine.complete("deploy -", CompletionRequestFlags::empty());
    assert!(!comps.iter().any(|c| c.text == "v"));
}

#[test]
fn test_command_descriptions_from_helper() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("git");
    std::fs::write(&exe, b"#!/bin/sh\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&exe).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&exe, perms).unwrap();
    }

    let mut host = test_host();
    host.expander = Arc::new(crate::expand::FilesystemExpander::new());
    host.env = Arc::new(TestEnv::new(&[("PATH", &dir.path().display().to_string())]));
    host.subshell = Arc::new(RecordingSubshell {
        lines: HashMap::from([(
            "__nacre_describe_command gi".to_string(),
            vec!["git\tdistributed version control".to_string()],
        )]),
        ..Default::default()
    });
    let engine = engine_with(host);

    let comps = engine.complete("gi", CompletionRequestFlags::DESCRIPTIONS);
    let hit = comps.iter().find(|c| applied("gi", c) == "git").expect("no git");
    // First character uppercased by the lookup
    assert_eq!(hit.description, "Distributed version control");
}

#[test]
fn test_old_style_option_argument() {
    let engine = engine_with(test_host());
    engine.add(
        "java",
        false,
        None,
        "version",
        true,
        ResultMode::NO_COMMON,
        "",
        "8 11 17",
        "",
    );

    let comps = engine.complete("java -version 1", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("1", c) == "11"));
    assert!(comps.iter().any(|c| applied("1", c) == "17"));
    assert!(!comps.iter().any(|c| applied("1", c) == "8"));
}

#[test]
fn test_exclusive_option_suppresses_files() {
    let engine = engine_with(test_host());
    engine.add(
        "kill",
        false,
        Some('s'),
        "signal",
        false,
        ResultMode::EXCLUSIVE,
        "",
        "TERM KILL",
        "",
    );

    let comps = engine.complete("kill -s T", CompletionRequestFlags::empty());
    assert!(comps.iter().any(|c| applied("T", c) == "TERM"));
    assert!(!comps.iter().any(|c| applied("T", c) == "KILL"));
}
