//! Error types emitted by the `fieldroute` command.
//!
//! Many helpers return `Result<_, CliError>`, so large payloads are kept
//! behind their source errors.

use std::sync::Arc;

use camino::Utf8PathBuf;
use fieldroute_core::OptimizationError;
use fieldroute_vroom::ClientBuildError;
use thiserror::Error;

/// Errors emitted by the `fieldroute` command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the state document failed.
    #[error("failed to open optimization state at {path:?}: {source}")]
    OpenState {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The state document is not a valid optimization state.
    #[error("failed to parse optimization state JSON at {path:?}: {source}")]
    ParseState {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Building the solver client failed.
    #[error("failed to build VROOM client for {base_url:?}: {source}")]
    BuildClient {
        base_url: String,
        #[source]
        source: ClientBuildError,
    },
    /// Solving or repairing the run failed.
    #[error("optimization failed: {0}")]
    Optimize(#[source] OptimizationError),
    /// Serializing the final state failed.
    #[error("failed to serialize optimization state: {0}")]
    SerializeState(#[source] serde_json::Error),
    /// Writing the final state to a file failed.
    #[error("failed to write optimization state to {path:?}: {source}")]
    WriteStateFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing to the console failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
