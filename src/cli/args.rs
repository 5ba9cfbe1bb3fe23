//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap.

use crate::packager::{PackageDetails, ScriptKind};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Win32 app packager for Microsoft Intune
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_intune",
    version,
    about = "Package Windows installers as .intunewin bundles and deploy them to Intune",
    long_about = "Stages an MSI or EXE, generates install/uninstall/detect scripts, wraps them with
IntuneWinAppUtil and optionally uploads the result to Intune.

Usage:
  kodegen_bundler_intune setup --tenant-id <id> --client-id <id> --tool-path C:/Tools/IntuneWinAppUtil.exe
  kodegen_bundler_intune build ./agent.msi --output ./out
  kodegen_bundler_intune upload ./out
  kodegen_bundler_intune test ./out/staging install

Exit code 0 = operation succeeded."
)]
pub struct Args {
    /// Configuration file (default: <config dir>/kodegen-intune/config.toml)
    #[arg(long, global = true, value_name = "PATH", env = "KODEGEN_INTUNE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print every event, including raw tool output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save tenant, app registration and packaging tool settings
    Setup(SetupArgs),

    /// Print the ProductCode, ProductName, ProductVersion and Manufacturer of an MSI
    Inspect {
        /// MSI file
        msi: PathBuf,
    },

    /// Build an .intunewin package
    Build(BuildArgs),

    /// Upload a built package to Intune
    Upload(UploadArgs),

    /// Run a staged script elevated and stream its transcript
    Test {
        /// Staging directory produced by `build`
        staging_dir: PathBuf,

        /// Script to run
        #[arg(value_enum)]
        script: TestScript,
    },
}

/// `setup` arguments
#[derive(ClapArgs, Debug)]
pub struct SetupArgs {
    /// Entra ID tenant
    #[arg(long)]
    pub tenant_id: String,

    /// App registration (client) id
    #[arg(long)]
    pub client_id: String,

    /// Path to IntuneWinAppUtil.exe (empty = look it up on PATH)
    #[arg(long, default_value = "")]
    pub tool_path: String,

    /// Client secret for the client-credentials flow
    #[arg(long, env = "KODEGEN_INTUNE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Graph endpoint root
    #[arg(long)]
    pub graph_base_url: Option<String>,

    /// Delegate upload script
    #[arg(long)]
    pub upload_script: Option<PathBuf>,

    /// Directory with install/uninstall/detect template overrides
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,
}

/// Package details shared by `build` and `upload`
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct DetailsArgs {
    /// Display name
    #[arg(long)]
    pub app_name: Option<String>,

    /// Publisher
    #[arg(long)]
    pub publisher: Option<String>,

    /// Display version
    #[arg(id = "app_version", long = "app-version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Description
    #[arg(long)]
    pub description: Option<String>,

    /// Install command (MSI) or installer arguments (EXE)
    #[arg(long)]
    pub install_cmd: Option<String>,

    /// Uninstall command (MSI) or installer arguments (EXE)
    #[arg(long)]
    pub uninstall_cmd: Option<String>,

    /// Product code (MSI) or path checked by Test-Path (EXE)
    #[arg(long)]
    pub detection_rule: Option<String>,

    /// PowerShell file run before the installer
    #[arg(long, value_name = "FILE")]
    pub pre_install: Option<PathBuf>,
}

impl DetailsArgs {
    /// Overrides fields of `details` with the ones given on the command line.
    pub fn apply(&self, details: &mut PackageDetails) {
        let fields = [
            (&self.app_name, &mut details.app_name),
            (&self.publisher, &mut details.publisher),
            (&self.version, &mut details.version),
            (&self.description, &mut details.description),
            (&self.install_cmd, &mut details.install_cmd),
            (&self.uninstall_cmd, &mut details.uninstall_cmd),
            (&self.detection_rule, &mut details.detection_rule),
        ];
        for (arg, field) in fields {
            if let Some(value) = arg {
                *field = value.clone();
            }
        }
    }
}

/// `build` arguments
#[derive(ClapArgs, Debug)]
pub struct BuildArgs {
    /// MSI or EXE installer
    pub source: PathBuf,

    /// Output directory (staging/ and the .intunewin are created here)
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    #[command(flatten)]
    pub details: DetailsArgs,
}

/// `upload` arguments
#[derive(ClapArgs, Debug)]
pub struct UploadArgs {
    /// Output directory of a previous `build`
    pub output: PathBuf,

    /// Installer the package was built from (used for auto-fill)
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Bearer token to use instead of the client-credentials flow
    #[arg(long, env = "KODEGEN_INTUNE_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    #[command(flatten)]
    pub details: DetailsArgs,
}

/// Script selectable by `test`
#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum TestScript {
    /// install.ps1
    Install,
    /// uninstall.ps1
    Uninstall,
    /// detect.ps1
    Detect,
}

impl From<TestScript> for ScriptKind {
    fn from(script: TestScript) -> Self {
        match script {
            TestScript::Install => ScriptKind::Install,
            TestScript::Uninstall => ScriptKind::Uninstall,
            TestScript::Detect => ScriptKind::Detect,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Build(build) if !build.source.is_file() => {
                Err(format!("Source installer not found: {}", build.source.display()))
            }
            Command::Inspect { msi } if !msi.is_file() => {
                Err(format!("MSI not found: {}", msi.display()))
            }
            Command::Setup(setup) if setup.tenant_id.trim().is_empty() => {
                Err("Tenant id cannot be empty".to_string())
            }
            Command::Setup(setup) if setup.client_id.trim().is_empty() => {
                Err("Client id cannot be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}
