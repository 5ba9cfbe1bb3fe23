//! `upload` command.

use super::{build::resolve_details, event_printer, load_config};
use crate::cli::{Args, OutputManager, args::UploadArgs};
use crate::error::{CliError, Result};
use crate::packager::{
    Config, EventSink, PackageDetails, ScriptKind, SourceType, UploadOrchestrator,
    builder::{PACKAGE_FILE_NAME, STAGING_DIR_NAME},
    upload::{ClientCredentials, GraphClient, StaticToken, TokenProvider},
    utils::fs::read_text,
};
use anyhow::Context as _;
use std::path::{Path, PathBuf};

/// Uploads `<output>/install.intunewin` with details from the staging dir.
pub async fn run_upload(args: &Args, upload: &UploadArgs, output: &OutputManager) -> Result<i32> {
    let config = load_config(args)?;
    let staging_dir = upload.output.join(STAGING_DIR_NAME);
    let package_path = upload.output.join(PACKAGE_FILE_NAME);

    let source = match &upload.source {
        Some(source) => source.clone(),
        None => find_staged_installer(&staging_dir).await?,
    };
    let mut details = resolve_details(&source, &upload.details).await?;

    let detect_path = staging_dir.join(ScriptKind::Detect.file_name());
    match read_text(&detect_path).await {
        Ok(script) => details.detection_script = Some(script),
        Err(e) => output.warn(&format!("Detection script unavailable: {}", e))?,
    }

    output.section(&format!("Uploading {} {}", details.app_name, details.version))?;
    let (sink, printer) = event_printer(*output, false);
    let result = match &upload.access_token {
        Some(token) => {
            upload_with(&config, StaticToken::new(token.clone()), sink, &package_path, &details).await
        }
        None => {
            let (tenant_id, client_id) = config.require_credentials()?;
            let secret = config.client_secret.as_deref().ok_or_else(|| CliError::NotConfigured {
                reason: "no client secret and no --access-token".into(),
            })?;
            let tokens = ClientCredentials::new(tenant_id, client_id, secret);
            upload_with(&config, tokens, sink, &package_path, &details).await
        }
    };
    printer.await.ok();

    let app_id = result?;
    output.success(&format!("Uploaded as app {}", app_id))?;
    Ok(0)
}

async fn upload_with<T: TokenProvider + Clone>(
    config: &Config,
    tokens: T,
    sink: EventSink,
    package_path: &Path,
    details: &PackageDetails,
) -> crate::packager::Result<String> {
    let catalog = GraphClient::new(config.graph_base_url(), tokens.clone());
    UploadOrchestrator::new(catalog, tokens, sink)
        .with_script(config.upload_script.clone())
        .upload(package_path, details)
        .await
}

/// Installer left in `staging_dir` by `build`. An MSI wins over an EXE,
/// otherwise the first by name.
async fn find_staged_installer(staging_dir: &Path) -> anyhow::Result<PathBuf> {
    let mut entries = tokio::fs::read_dir(staging_dir)
        .await
        .with_context(|| format!("reading staging directory {}", staging_dir.display()))?;
    let mut installers = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("reading staging directory {}", staging_dir.display()))?
    {
        let path = entry.path();
        let is_installer = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("msi") || ext.eq_ignore_ascii_case("exe"));
        if is_installer && path.is_file() {
            installers.push(path);
        }
    }
    installers.sort();
    // prefer MSI: its properties drive the defaults
    let msi = installers
        .iter()
        .position(|path| SourceType::from_path(path) == SourceType::Msi);
    let found = match msi {
        Some(index) => Some(installers.swap_remove(index)),
        None => installers.into_iter().next(),
    };
    found.with_context(|| format!("no installer found in {}; pass --source", staging_dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_msi_is_preferred_over_exe() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a-setup.exe", "detect.ps1", "z-agent.MSI"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let found = find_staged_installer(dir.path()).await.unwrap();
        assert_eq!(found, dir.path().join("z-agent.MSI"));
    }

    #[tokio::test]
    async fn staging_without_installer_asks_for_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("install.ps1"), b"x").unwrap();

        let err = find_staged_installer(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("pass --source"));

        let err = find_staged_installer(&dir.path().join("missing")).await.unwrap_err();
        assert!(err.to_string().contains("reading staging directory"));
    }
}
