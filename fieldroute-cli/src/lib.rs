//! Command-line interface for field-service route optimization.
//!
//! `fieldroute optimize <state.json>` loads a PRE optimization state, solves
//! it with VROOM, repairs the solved routes and prints the final state.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod files;
mod optimize;

pub use error::CliError;

use optimize::OptimizeArgs;

const ARG_STATE: &str = "state";
const ARG_VROOM_URL: &str = "vroom-url";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_OUTPUT: &str = "output";
const ARG_LONG_INACTIVITY: &str = "long-inactivity-minutes";
const ARG_AVERAGE_INACTIVITY: &str = "average-inactivity-minutes";
const ARG_FIRST_APPOINTMENT_INACTIVITY: &str = "first-appointment-inactivity-minutes";
const ENV_STATE: &str = "FIELDROUTE_CMDS_OPTIMIZE_STATE_PATH";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] describing the first failure.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Optimize(args) => optimize::run_optimize(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "fieldroute",
    about = "Optimize field-service technician routes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve and repair an optimization state.
    Optimize(OptimizeArgs),
}

#[cfg(test)]
mod tests;
