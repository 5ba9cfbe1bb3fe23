//! Two-phase upload: metadata through the catalog client, binary through a
//! delegate script.

use super::{
    auth::TokenProvider,
    client::AppCatalog,
    metadata::Win32LobApp,
    protocol::{DelegateLine, METADATA_PROGRESS_SHARE, overall_progress},
};
use crate::packager::{
    error::{Error, Result},
    events::EventSink,
    process::{ScriptHost, run_streaming},
    settings::PackageDetails,
};
use std::path::{Path, PathBuf};

/// Delegate script performing the content upload and commit handshake.
pub const UPLOAD_SCRIPT_NAME: &str = "IntuneUpload.ps1";

/// Progress reported when the upload starts.
const PROGRESS_STARTED: f64 = 0.05;

/// Upload orchestrator.
///
/// 1. Posts a `win32LobApp` object through the [`AppCatalog`] and keeps the
///    returned id (progress 0.05 → 0.15).
/// 2. Runs the delegate script with a fresh token, the package path, the app
///    id and display metadata, translating its line protocol into
///    status/progress events (0.15 → 1.0).
///
/// Nothing is retried. The delegate's exit code is the authority on success;
/// `ERROR:` lines are only surfaced as status.
#[derive(Debug)]
pub struct UploadOrchestrator<C, T> {
    catalog: C,
    tokens: T,
    host: ScriptHost,
    script: Option<PathBuf>,
    sink: EventSink,
}

impl<C: AppCatalog, T: TokenProvider> UploadOrchestrator<C, T> {
    /// Creates an uploader using PowerShell and the default script lookup.
    pub fn new(catalog: C, tokens: T, sink: EventSink) -> Self {
        Self {
            catalog,
            tokens,
            host: ScriptHost::powershell(),
            script: None,
            sink,
        }
    }

    /// Replaces the interpreter used for the delegate script.
    pub fn with_host(mut self, host: ScriptHost) -> Self {
        self.host = host;
        self
    }

    /// Uses an explicit delegate script instead of the default lookup.
    pub fn with_script(mut self, script: Option<PathBuf>) -> Self {
        self.script = script;
        self
    }

    /// Uploads `package_path` and returns the remote app id.
    ///
    /// The package and delegate script are checked before anything is sent,
    /// so a local problem never leaves an app behind in the catalog. A failure
    /// is reported through the sink as `Upload failed: ...` and returned.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when no delegate script can be found.
    /// [`Error::Upload`] when the package is missing, metadata creation fails,
    /// the delegate cannot be started, or it exits non-zero (the exit code is
    /// part of the message).
    pub async fn upload(&self, package_path: &Path, details: &PackageDetails) -> Result<String> {
        match self.run_upload(package_path, details).await {
            Ok(app_id) => Ok(app_id),
            Err(e) => {
                self.sink.status(format!("Upload failed: {}", e));
                log::error!("Upload failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_upload(&self, package_path: &Path, details: &PackageDetails) -> Result<String> {
        self.sink.status("Initializing Intune upload...");
        self.sink.progress(PROGRESS_STARTED);

        if !package_path.is_file() {
            return Err(Error::Upload(format!(
                "package not found at {}; build it first",
                package_path.display()
            )));
        }
        let file_name = package_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let script = locate_upload_script(self.script.as_deref())?;
        self.sink.status(format!("Using script at: {}", script.display()));

        self.sink.status("Preparing application metadata...");
        let app = Win32LobApp::from_details(details, &file_name);

        self.sink.status("Syncing application metadata to Intune...");
        let app_id = self.catalog.create_app(&app).await.map_err(|e| match e {
            Error::Upload(_) => e,
            other => Error::Upload(format!("creating app metadata: {}", other)),
        })?;
        self.sink.status(format!("Metadata synced, app id: {}", app_id));
        self.sink.progress(METADATA_PROGRESS_SHARE);

        self.sink.status("Handing content upload to the delegate script...");
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| Error::Upload(format!("obtaining access token: {}", e)))?;

        let mut command = self.host.command(&script);
        command
            .arg("-AccessToken")
            .arg(&token)
            .arg("-IntunewinFile")
            .arg(package_path)
            .arg("-AppId")
            .arg(&app_id)
            .arg("-AppName")
            .arg(&details.app_name)
            .arg("-Publisher")
            .arg(&details.publisher)
            .arg("-Version")
            .arg(&details.version)
            .arg("-Description")
            .arg(details.display_description());

        let result = run_streaming(command, &self.host.name(), |line| self.handle_line(line))
            .await
            .map_err(|e| Error::Upload(format!("starting upload script: {}", e)))?;

        if !result.success() {
            return Err(Error::Upload(format!(
                "upload script failed (exit code {})",
                result.exit_code
            )));
        }

        self.sink.status("Intune deployment successful, app is ready.");
        self.sink.progress(1.0);
        Ok(app_id)
    }

    fn handle_line(&self, line: &str) {
        log::info!("[upload script] {}", line);
        match DelegateLine::parse(line) {
            DelegateLine::Status(message) => self.sink.status(message),
            DelegateLine::Progress(pct) => self.sink.progress(overall_progress(pct)),
            DelegateLine::Error(message) => {
                self.sink.status(format!("Upload script fault: {}", message))
            }
            DelegateLine::Raw(line) => self.sink.log(line),
        }
    }
}

/// Finds the delegate upload script.
///
/// An explicit path must exist. Otherwise the script is looked up next to the
/// running executable, then in the working directory.
pub fn locate_upload_script(explicit: Option<&Path>) -> Result<PathBuf> {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().unwrap_or_default();
    locate_in(explicit, beside_exe.as_deref(), &cwd)
}

fn locate_in(explicit: Option<&Path>, exe_dir: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(Error::Configuration(format!(
                "upload script not found at {}",
                path.display()
            )))
        };
    }

    let beside_exe = exe_dir.map(|dir| dir.join(UPLOAD_SCRIPT_NAME));
    let in_cwd = cwd.join(UPLOAD_SCRIPT_NAME);
    if let Some(found) = beside_exe.iter().chain([&in_cwd]).find(|path| path.is_file()) {
        return Ok(found.clone());
    }

    Err(Error::Configuration(format!(
        "{} not found next to the executable ({}) or in the working directory ({})",
        UPLOAD_SCRIPT_NAME,
        beside_exe
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".into()),
        in_cwd.display()
    )))
}
