//! Test helpers for writing state documents and stubbing engines.

use camino::{Utf8Path, Utf8PathBuf};
use fieldroute_core::test_support::{RouteBuilder, StubEngine, appointment, office, window};
use fieldroute_core::{Engine, EngineRegistry, OptimizationParams, OptimizationState, Waiting};
use tempfile::TempDir;

use crate::CliError;
use crate::optimize::{EngineRegistryBuilder, OptimizeConfig};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent directories");
    }
    std::fs::write(path, contents).expect("write fixture file");
}

pub(super) fn utf8_workspace() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// A PRE state holding one route with two hours of idle time.
pub(super) fn idle_state() -> OptimizationState {
    let mut state = OptimizationState::new(
        Engine::Vroom,
        office(),
        window("00:00", "23:59"),
        OptimizationParams::default(),
    )
    .with_id(12);
    state.routes.push(
        RouteBuilder::new(1)
            .event(appointment(1, "Visit").scheduled(window("08:00", "08:30")))
            .event(Waiting::new(1, window("08:30", "10:30")))
            .event(appointment(2, "Visit").scheduled(window("10:30", "11:00")))
            .build(),
    );
    state
}

pub(super) fn write_state(path: &Utf8Path, state: &OptimizationState) {
    let payload = serde_json::to_string_pretty(state).expect("serialize state");
    write_utf8(path, payload.as_bytes());
}

/// Registers an engine that returns every route unchanged.
pub(super) struct IdentityRegistryBuilder;

impl EngineRegistryBuilder for IdentityRegistryBuilder {
    fn build(&self, _config: &OptimizeConfig) -> Result<EngineRegistry, CliError> {
        Ok(EngineRegistry::new().with_engine(StubEngine::identity(Engine::Vroom)))
    }
}
