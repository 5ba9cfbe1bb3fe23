//! `setup` command.

use crate::cli::{Args, OutputManager, args::SetupArgs};
use crate::error::Result;
use crate::packager::Config;

/// Writes the configuration file.
pub async fn run_setup(args: &Args, setup: &SetupArgs, output: &OutputManager) -> Result<i32> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    let config = Config {
        tenant_id: setup.tenant_id.trim().to_string(),
        client_id: setup.client_id.trim().to_string(),
        tool_path: setup.tool_path.trim().to_string(),
        client_secret: setup.client_secret.clone(),
        graph_base_url: setup.graph_base_url.clone(),
        upload_script: setup.upload_script.clone(),
        templates_dir: setup.templates_dir.clone(),
    };
    config.save(&path)?;

    output.success(&format!("Configuration saved to {}", path.display()))?;
    if !config.is_setup_complete() {
        output.warn("No tool path given; IntuneWinAppUtil will be looked up on PATH")?;
    }
    Ok(0)
}
