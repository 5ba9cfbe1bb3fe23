//! MSI property inspection and detail auto-fill.

use crate::packager::{
    process::run_streaming,
    script::ps_single_quote,
    settings::{PackageDetails, SourceType},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::process::Command;

/// Properties read from the MSI `Property` table.
pub const MSI_PROPERTIES: [&str; 4] = ["ProductCode", "ProductName", "ProductVersion", "Manufacturer"];

/// Publisher used when the MSI has no `Manufacturer`.
pub const UNKNOWN_PUBLISHER: &str = "Unknown Publisher";

/// Version used when the MSI has no `ProductVersion`.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Silent-install switch assumed for EXE installers.
pub const DEFAULT_EXE_ARGS: &str = "/S";

/// PowerShell that prints `Key=Value` for each wanted property.
pub fn inspection_script(msi_path: &Path) -> String {
    format!(
        "$path = '{}'; \
         $wi = New-Object -com WindowsInstaller.Installer; \
         $db = $wi.OpenDatabase($path, 0); \
         $view = $db.OpenView(\"SELECT Property, Value FROM Property\"); \
         $view.Execute(); \
         while ($record = $view.Fetch()) {{ \
             if ($record.StringData(1) -match '^({})$') {{ \
                 Write-Output ($record.StringData(1) + '=' + $record.StringData(2)) \
             }} \
         }}",
        ps_single_quote(&msi_path.display().to_string()),
        MSI_PROPERTIES.join("|")
    )
}

/// Encodes a script for `powershell -EncodedCommand` (UTF-16LE, base64).
pub fn encode_command(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    STANDARD.encode(bytes)
}

/// Collects the wanted `Key=Value` pairs from inspector output.
pub fn parse_properties<'a>(lines: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
    lines
        .into_iter()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| MSI_PROPERTIES.contains(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Reads the core properties of an MSI.
///
/// Any failure (no PowerShell, not an MSI, COM error) is logged and yields an
/// empty map.
pub async fn inspect_msi(msi_path: &Path) -> BTreeMap<String, String> {
    let mut command = Command::new("powershell.exe");
    command
        .arg("-NoProfile")
        .arg("-NonInteractive")
        .arg("-EncodedCommand")
        .arg(encode_command(&inspection_script(msi_path)));

    match run_streaming(command, "powershell.exe", |_| {}).await {
        Ok(result) => {
            if !result.success() {
                log::warn!(
                    "MSI inspection of {} exited with code {}",
                    msi_path.display(),
                    result.exit_code
                );
            }
            parse_properties(result.combined_output.iter().map(String::as_str))
        }
        Err(e) => {
            log::warn!("MSI inspection of {} failed: {}", msi_path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Default details for `source`, using inspected MSI properties when given.
///
/// Explicit user input is applied on top of this by the caller.
pub fn auto_fill(source: &Path, props: &BTreeMap<String, String>) -> PackageDetails {
    let details = PackageDetails::default().with_source(source);
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prop = |key: &str| props.get(key).filter(|value| !value.is_empty()).cloned();

    match details.source_type {
        SourceType::Msi => {
            let product_code = prop("ProductCode").unwrap_or_default();
            PackageDetails {
                app_name: prop("ProductName").unwrap_or(stem),
                publisher: prop("Manufacturer").unwrap_or_else(|| UNKNOWN_PUBLISHER.into()),
                version: prop("ProductVersion").unwrap_or_else(|| DEFAULT_VERSION.into()),
                install_cmd: format!("msiexec /i \"{}\" /qn /norestart", details.source_file_name),
                uninstall_cmd: format!("msiexec /x {} /qn /norestart", product_code),
                detection_rule: product_code,
                ..details
            }
        }
        SourceType::Exe => PackageDetails {
            app_name: stem,
            publisher: UNKNOWN_PUBLISHER.into(),
            version: DEFAULT_VERSION.into(),
            install_cmd: DEFAULT_EXE_ARGS.into(),
            uninstall_cmd: DEFAULT_EXE_ARGS.into(),
            ..details
        },
    }
}
