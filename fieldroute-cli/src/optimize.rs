//! `optimize` command: solve a state document and repair its routes.

use std::io::{BufReader, Write};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use fieldroute_core::{EngineRegistry, OptimizationState, PriorityConfig};
use fieldroute_reopt::{ReoptimizationConfig, RunOutcome, optimize_and_repair};
use fieldroute_vroom::{VroomClient, VroomClientConfig, VroomEngine};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::files::{file_is_file, open_utf8_file, write_utf8_file};
use crate::{
    ARG_AVERAGE_INACTIVITY, ARG_FIRST_APPOINTMENT_INACTIVITY, ARG_LONG_INACTIVITY, ARG_OUTPUT,
    ARG_STATE, ARG_TIMEOUT_SECS, ARG_VROOM_URL, CliError, ENV_STATE,
};

/// CLI arguments for the `optimize` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Solve a PRE optimization state with a VROOM server, validate \
                 every solved route and re-solve routes with excessive idle \
                 time or back-to-back breaks. The final state is printed as \
                 JSON unless --output names a file.",
    about = "Solve and repair an optimization state"
)]
#[ortho_config(prefix = "FIELDROUTE")]
pub(crate) struct OptimizeArgs {
    /// Path to a JSON file containing a PRE optimization state.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) state_path: Option<Utf8PathBuf>,
    /// Base URL of the VROOM server (e.g. "http://localhost:3000").
    #[arg(long = ARG_VROOM_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) vroom_url: Option<String>,
    /// Solver request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Write the final state here instead of standard output.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Ceiling for any single idle gap.
    #[arg(long = ARG_LONG_INACTIVITY, value_name = "minutes")]
    #[serde(default)]
    pub(crate) long_inactivity_minutes: Option<u64>,
    /// Ceiling for the mean idle gap of a route.
    #[arg(long = ARG_AVERAGE_INACTIVITY, value_name = "minutes")]
    #[serde(default)]
    pub(crate) average_inactivity_minutes: Option<u64>,
    /// Ceiling for idle time before the first appointment.
    #[arg(long = ARG_FIRST_APPOINTMENT_INACTIVITY, value_name = "minutes")]
    #[serde(default)]
    pub(crate) first_appointment_inactivity_minutes: Option<u64>,
}

impl OptimizeArgs {
    fn into_config(self) -> Result<OptimizeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        OptimizeConfig::try_from(merged)
    }
}

/// Resolved `optimize` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptimizeConfig {
    /// Path to the PRE state document.
    pub(crate) state_path: Utf8PathBuf,
    /// Destination for the final state, standard output when absent.
    pub(crate) output: Option<Utf8PathBuf>,
    /// Solver connection settings.
    pub(crate) client: VroomClientConfig,
    /// Validator thresholds.
    pub(crate) reoptimization: ReoptimizationConfig,
    /// Office-wide appointment priorities and setup times.
    pub(crate) priority: PriorityConfig,
}

impl OptimizeConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        let path = &self.state_path;
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field: ARG_STATE,
                path: path.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_STATE,
                    path: path.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_STATE,
                path: path.clone(),
                source,
            }),
        }
    }
}

const fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

impl TryFrom<OptimizeArgs> for OptimizeConfig {
    type Error = CliError;

    fn try_from(args: OptimizeArgs) -> Result<Self, Self::Error> {
        let state_path = args.state_path.ok_or(CliError::MissingArgument {
            field: ARG_STATE,
            env: ENV_STATE,
        })?;

        let mut client = args
            .vroom_url
            .map_or_else(VroomClientConfig::default, VroomClientConfig::new);
        if let Some(seconds) = args.timeout_secs {
            client = client.with_timeout(Duration::from_secs(seconds));
        }

        let mut reoptimization = ReoptimizationConfig::default();
        if let Some(limit) = args.long_inactivity_minutes {
            reoptimization = reoptimization.with_long_inactivity(minutes(limit));
        }
        if let Some(limit) = args.average_inactivity_minutes {
            reoptimization = reoptimization.with_average_inactivity(minutes(limit));
        }
        if let Some(limit) = args.first_appointment_inactivity_minutes {
            reoptimization = reoptimization.with_inactivity_before_first_appointment(minutes(limit));
        }

        Ok(Self {
            state_path,
            output: args.output,
            client,
            reoptimization,
            priority: PriorityConfig::default(),
        })
    }
}

/// Builds the engine registry for one invocation.
pub(crate) trait EngineRegistryBuilder {
    fn build(&self, config: &OptimizeConfig) -> Result<EngineRegistry, CliError>;
}

pub(crate) struct VroomRegistryBuilder;

impl EngineRegistryBuilder for VroomRegistryBuilder {
    fn build(&self, config: &OptimizeConfig) -> Result<EngineRegistry, CliError> {
        let client = VroomClient::with_config(config.client.clone()).map_err(|source| {
            CliError::BuildClient {
                base_url: config.client.base_url.clone(),
                source,
            }
        })?;
        Ok(EngineRegistry::new().with_engine(VroomEngine::new(client)))
    }
}

pub(crate) fn run_optimize(args: OptimizeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();
    run_optimize_with(args, &VroomRegistryBuilder, &mut stdout, &mut stderr)
}

pub(crate) fn run_optimize_with(
    args: OptimizeArgs,
    builder: &dyn EngineRegistryBuilder,
    writer: &mut dyn Write,
    diagnostics: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let outcome = execute_optimize(&config, builder)?;
    write_state(&config, writer, &outcome.state)?;
    write_summary(diagnostics, &outcome)
}

fn execute_optimize(
    config: &OptimizeConfig,
    builder: &dyn EngineRegistryBuilder,
) -> Result<RunOutcome, CliError> {
    let mut pre = load_state(&config.state_path)?;
    // Derived appointment attributes are not trusted from the document.
    pre.reclassify_appointments(&config.priority);
    let registry = builder.build(config)?;
    optimize_and_repair(&pre, &registry, &config.reoptimization).map_err(CliError::Optimize)
}

/// Loads a JSON-encoded [`OptimizationState`] from disk.
pub(crate) fn load_state(path: &Utf8Path) -> Result<OptimizationState, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenState {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseState {
        path: path.to_path_buf(),
        source,
    })
}

fn write_state(
    config: &OptimizeConfig,
    writer: &mut dyn Write,
    state: &OptimizationState,
) -> Result<(), CliError> {
    let mut payload = serde_json::to_string_pretty(state).map_err(CliError::SerializeState)?;
    payload.push('\n');
    match &config.output {
        Some(path) => {
            write_utf8_file(path, payload.as_bytes()).map_err(|source| {
                CliError::WriteStateFile {
                    path: path.clone(),
                    source,
                }
            })?;
            log::debug!("wrote {} state to {path}", state.status());
            Ok(())
        }
        None => writer
            .write_all(payload.as_bytes())
            .map_err(CliError::WriteOutput),
    }
}

fn write_summary(diagnostics: &mut dyn Write, outcome: &RunOutcome) -> Result<(), CliError> {
    let unresolved = outcome.report.unresolved();
    log::info!(
        "office {}: {} routes, {} unresolved",
        outcome.state.office.id,
        outcome.state.routes.len(),
        unresolved.len()
    );
    writeln!(
        diagnostics,
        "{} routes optimized, {} re-solves, {} unresolved",
        outcome.state.routes.len(),
        outcome.report.total_attempts(),
        unresolved.len()
    )
    .map_err(CliError::WriteOutput)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<OptimizeConfig, CliError> {
    let merged = OptimizeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    OptimizeConfig::try_from(merged)
}
