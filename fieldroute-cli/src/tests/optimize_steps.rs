//! Behaviour-driven step definitions driving the optimize CLI scenarios.

use super::helpers::{IdentityRegistryBuilder, idle_state, utf8_workspace, write_state, write_utf8};
use super::*;
use crate::optimize::run_optimize_with;
use camino::Utf8PathBuf;
use clap::Parser;
use fieldroute_core::{OptimizationState, OptimizationStatus};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct OptimizeWorld {
    _tmp: TempDir,
    state_path: Utf8PathBuf,
    include_state: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    stderr: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl OptimizeWorld {
    fn new() -> Self {
        let (tmp, root) = utf8_workspace();
        Self {
            _tmp: tmp,
            state_path: root.join("state.json"),
            include_state: RefCell::new(true),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            stderr: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["fieldroute".to_owned(), "optimize".to_owned()];
        if *self.include_state.borrow() {
            argv.push(self.state_path.as_str().to_owned());
        }
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            match result.as_ref().expect("result recorded") {
                Err(err) => err,
                Ok(()) => panic!("expected an error"),
            }
        })
    }

    fn summary(&self) -> String {
        String::from_utf8(self.stderr.borrow().clone()).expect("stderr utf-8")
    }
}

#[fixture]
fn world() -> OptimizeWorld {
    OptimizeWorld::new()
}

// --- Given steps ---

#[given("a state with two hours of idle time exists on disk")]
fn idle_state_exists(#[from(world)] world: &OptimizeWorld) {
    write_state(&world.state_path, &idle_state());
}

#[given("the state file contains invalid JSON")]
fn state_contains_invalid_json(#[from(world)] world: &OptimizeWorld) {
    write_utf8(&world.state_path, b"{ not valid json");
}

#[given("I omit the state path")]
fn omit_state_path(#[from(world)] world: &OptimizeWorld) {
    *world.include_state.borrow_mut() = false;
}

#[given("I pass --long-inactivity-minutes 180 and --average-inactivity-minutes 180")]
fn relax_thresholds(#[from(world)] world: &OptimizeWorld) {
    world.cli_args.borrow_mut().extend([
        format!("--{ARG_LONG_INACTIVITY}"),
        "180".to_owned(),
        format!("--{ARG_AVERAGE_INACTIVITY}"),
        "180".to_owned(),
    ]);
}

// --- When steps ---

#[when("I run the optimize command")]
fn run_optimize_command(#[from(world)] world: &OptimizeWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Optimize(args) => {
            let mut stdout = world.stdout.borrow_mut();
            let mut stderr = world.stderr.borrow_mut();
            run_optimize_with(args, &IdentityRegistryBuilder, &mut *stdout, &mut *stderr)
        }
    });
    world.result.replace(Some(outcome));
}

// --- Then steps ---

#[then("the command succeeds and prints a POST state")]
fn command_prints_post_state(#[from(world)] world: &OptimizeWorld) {
    let borrowed = world.result.borrow();
    if let Some(Err(err)) = borrowed.as_ref() {
        panic!("expected success, found {err:?}");
    }
    let stdout = String::from_utf8(world.stdout.borrow().clone()).expect("stdout utf-8");
    let state: OptimizationState =
        serde_json::from_str(&stdout).expect("output should be an optimization state");
    assert_eq!(state.status(), OptimizationStatus::Post);
    assert_eq!(state.routes.len(), 1);
}

#[then("the summary reports 1 unresolved route")]
fn summary_reports_unresolved(#[from(world)] world: &OptimizeWorld) {
    assert!(world.summary().ends_with(", 1 unresolved\n"), "{}", world.summary());
}

#[then("the summary reports 0 unresolved routes")]
fn summary_reports_resolved(#[from(world)] world: &OptimizeWorld) {
    assert_eq!(world.summary(), "1 routes optimized, 0 re-solves, 0 unresolved\n");
}

#[then("the command fails because the state JSON is invalid")]
fn command_fails_invalid_json(#[from(world)] world: &OptimizeWorld) {
    match &*world.error() {
        CliError::ParseState { path, .. } => assert_eq!(*path, world.state_path),
        other => panic!("expected ParseState, found {other:?}"),
    }
}

#[then("the command fails because the state path is missing")]
fn command_fails_missing_state(#[from(world)] world: &OptimizeWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_STATE),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

// --- Scenario registrations ---

macro_rules! register_optimize_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/optimize_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: OptimizeWorld) {
            let _ = world;
        }
    };
}

register_optimize_scenario!(optimize_happy_path, "optimizing a state from JSON");
register_optimize_scenario!(optimize_invalid_json, "rejecting invalid JSON input");
register_optimize_scenario!(optimize_missing_state, "rejecting missing state paths");
register_optimize_scenario!(optimize_relaxed_thresholds, "relaxing thresholds from flags");
