//! `inspect` command.

use crate::cli::OutputManager;
use crate::error::Result;
use crate::packager::inspect::inspect_msi;
use std::path::Path;

/// Prints the core properties of an MSI.
pub async fn run_inspect(msi: &Path, output: &OutputManager) -> Result<i32> {
    output.section(&format!("MSI properties of {}", msi.display()))?;

    let props = inspect_msi(msi).await;
    if props.is_empty() {
        output.warn("No properties could be read (is this a Windows host with Windows Installer?)")?;
        return Ok(1);
    }
    for (key, value) in &props {
        output.indent(&format!("{} = {}", key, value))?;
    }
    Ok(0)
}
