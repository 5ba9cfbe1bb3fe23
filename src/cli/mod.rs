//! Command line interface for the Intune packager.
//!
//! This module provides argument parsing, command dispatch and colored
//! terminal output.

mod args;
pub mod commands;
mod output;

pub use args::{Args, BuildArgs, Command, DetailsArgs, SetupArgs, TestScript, UploadArgs};
pub use output::OutputManager;

use crate::error::{CliError, Result};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with(args).await
}

/// Runs already-parsed arguments and returns the process exit code.
pub async fn run_with(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;
    let output = OutputManager::new(args.verbose, args.quiet);

    match &args.command {
        Command::Setup(setup) => commands::run_setup(&args, setup, &output).await,
        Command::Inspect { msi } => commands::run_inspect(msi, &output).await,
        Command::Build(build) => commands::run_build(&args, build, &output).await,
        Command::Upload(upload) => commands::run_upload(&args, upload, &output).await,
        Command::Test { staging_dir, script } => {
            commands::run_test(staging_dir, *script, &output).await
        }
    }
}
