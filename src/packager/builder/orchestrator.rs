//! Build orchestration.
//!
//! This module provides the [`BuildOrchestrator`] that stages an installer,
//! generates its deployment scripts and wraps everything into an
//! `.intunewin` package.

use super::{checksum::calculate_sha256, packaging::run_intunewin_util, tool_detection::resolve_tool};
use crate::packager::{
    error::{Context, Error, ErrorExt, Result},
    events::EventSink,
    harness::{RUNNER_FILE_NAME, TRANSCRIPT_FILE_NAME},
    script::{ScriptGenerator, ScriptKind},
    settings::{Config, PackageDetails},
    utils::fs,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Name of the staging directory under the output directory.
pub const STAGING_DIR_NAME: &str = "staging";

/// Setup file handed to the packaging tool.
pub const SETUP_FILE_NAME: &str = "install.ps1";

/// Package produced by the packaging tool for [`SETUP_FILE_NAME`].
pub const PACKAGE_FILE_NAME: &str = "install.intunewin";

/// Files written into staging by the test harness. They are removed on every
/// build so they never end up inside a package.
pub const HARNESS_ARTIFACTS: [&str; 2] = [RUNNER_FILE_NAME, TRANSCRIPT_FILE_NAME];

/// Progress after the staging directory exists.
pub const PROGRESS_WORKSPACE: f64 = 0.2;
/// Progress after the installer is copied.
pub const PROGRESS_STAGED: f64 = 0.4;
/// Progress after the scripts are generated.
pub const PROGRESS_SCRIPTS: f64 = 0.6;

/// Result of one build.
#[derive(Debug)]
pub struct BuildOutcome {
    /// True when every step succeeded and the tool exited 0
    pub success: bool,
    /// Expected `.intunewin` location
    pub package_path: PathBuf,
    /// Staging directory used for this job
    pub staging_dir: PathBuf,
    /// SHA-256 of the package, when it could be read
    pub checksum: Option<String>,
    /// Why the build failed
    pub failure: Option<Error>,
}

/// Build orchestrator.
///
/// Steps, with the progress reported after each:
///
/// 1. create `<output>/staging` (0.2)
/// 2. copy the installer into staging (0.4)
/// 3. derive source file name and type
/// 4. render install, uninstall and detect scripts (0.6)
/// 5. read `detect.ps1` back into [`PackageDetails::detection_script`]
/// 6. run the packaging tool (1.0 on success)
///
/// A failing step stops the build and resets progress to 0.0.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_intune::packager::{BuildOrchestrator, Config, EventSink, PackageDetails};
/// use std::path::Path;
///
/// # async fn example(config: Config) -> kodegen_bundler_intune::packager::Result<()> {
/// let (sink, _events) = EventSink::channel();
/// let builder = BuildOrchestrator::new(&config, sink);
///
/// let mut details = PackageDetails {
///     app_name: "Agent".into(),
///     install_cmd: "msiexec /i \"agent.msi\" /qn".into(),
///     ..Default::default()
/// };
/// let outcome = builder
///     .build(Path::new("agent.msi"), Path::new("out"), &mut details)
///     .await?;
/// println!("success: {}", outcome.success);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    tool_path: String,
    generator: ScriptGenerator,
    sink: EventSink,
}

impl BuildOrchestrator {
    /// Creates a builder from configuration.
    pub fn new(config: &Config, sink: EventSink) -> Self {
        Self {
            tool_path: config.tool_path.clone(),
            generator: ScriptGenerator::with_templates_dir(config.templates_dir.clone()),
            sink,
        }
    }

    /// Replaces the script generator.
    pub fn with_generator(mut self, generator: ScriptGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Runs the full build.
    ///
    /// # Errors
    ///
    /// Only configuration problems are returned as errors: a missing tool path
    /// ([`Error::Configuration`]) or a tool binary that does not exist
    /// ([`Error::ToolNotFound`]). Both are reported before any file is
    /// touched. Every other failure is reported through the sink and
    /// [`BuildOutcome::failure`].
    pub async fn build(
        &self,
        source_file: &Path,
        output_dir: &Path,
        details: &mut PackageDetails,
    ) -> Result<BuildOutcome> {
        let tool = match resolve_tool(&self.tool_path) {
            Ok(tool) => tool,
            Err(e) => {
                self.sink.status(format!("Error: {}", e));
                return Err(e);
            }
        };

        let staging_dir = output_dir.join(STAGING_DIR_NAME);
        let package_path = output_dir.join(PACKAGE_FILE_NAME);

        match self.run_steps(&tool, source_file, output_dir, &staging_dir, details).await {
            Ok(()) => {
                self.sink.progress(1.0);
                self.sink.status("Success!");
                log::info!("✓ Created package: {}", package_path.display());

                let checksum = match calculate_sha256(&package_path).await {
                    Ok(checksum) => Some(checksum),
                    Err(e) => {
                        log::warn!("Package checksum unavailable: {}", e);
                        None
                    }
                };

                Ok(BuildOutcome {
                    success: true,
                    package_path,
                    staging_dir,
                    checksum,
                    failure: None,
                })
            }
            Err(e) => {
                self.sink.progress(0.0);
                self.sink.status(format!("Failed: {}", e));
                log::error!("Build failed: {}", e);

                Ok(BuildOutcome {
                    success: false,
                    package_path,
                    staging_dir,
                    checksum: None,
                    failure: Some(e),
                })
            }
        }
    }

    async fn run_steps(
        &self,
        tool: &Path,
        source_file: &Path,
        output_dir: &Path,
        staging_dir: &Path,
        details: &mut PackageDetails,
    ) -> Result<()> {
        self.sink.status("Preparing workspace...");
        fs::create_dir_all(staging_dir).await?;
        for artifact in HARNESS_ARTIFACTS {
            fs::remove_file_if_exists(&staging_dir.join(artifact)).await?;
        }
        self.sink.progress(PROGRESS_WORKSPACE);

        self.sink.status("Copying installer to staging...");
        let file_name = source_file
            .file_name()
            .context("installer path has no file name")?;
        let staged = staging_dir.join(file_name);
        remove_stale_installers(staging_dir, file_name).await?;
        if fs::is_same_file(source_file, &staged).await {
            log::info!("Installer already staged at {}", staged.display());
        } else {
            fs::copy_file(source_file, &staged).await?;
        }
        self.sink.progress(PROGRESS_STAGED);

        *details = std::mem::take(details).with_source(source_file);

        self.sink.status("Generating PowerShell scripts...");
        for kind in ScriptKind::ALL {
            self.generator.render(kind, details, staging_dir).await?;
        }

        let detect_path = staging_dir.join(ScriptKind::Detect.file_name());
        if detect_path.is_file() {
            match fs::read_text(&detect_path).await {
                Ok(script) => details.detection_script = Some(script),
                Err(e) => log::warn!("Could not read back detection script: {}", e),
            }
        } else {
            log::warn!("Detection script missing at {}", detect_path.display());
        }
        self.sink.progress(PROGRESS_SCRIPTS);

        self.sink.status("Running IntuneWinAppUtil...");
        run_intunewin_util(tool, staging_dir, SETUP_FILE_NAME, output_dir, &self.sink)
            .await?
            .into_result(&tool.display().to_string())?;

        Ok(())
    }
}

/// Deletes installers left in staging by an earlier build of a different
/// source, so exactly one installer is packaged.
async fn remove_stale_installers(staging_dir: &Path, keep: &OsStr) -> Result<()> {
    let mut entries = tokio::fs::read_dir(staging_dir)
        .await
        .fs_context("reading staging directory", staging_dir)?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .fs_context("reading staging directory", staging_dir)?
    {
        let path = entry.path();
        if entry.file_name().as_os_str() == keep || !path.is_file() || !is_installer(&path) {
            continue;
        }
        log::debug!("Removing stale installer {}", path.display());
        fs::remove_file_if_exists(&path).await?;
    }
    Ok(())
}

fn is_installer(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("msi") || ext.eq_ignore_ascii_case("exe"))
}
