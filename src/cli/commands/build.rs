//! `build` command.

use super::{event_printer, load_config};
use crate::cli::{Args, OutputManager, args::{BuildArgs, DetailsArgs}};
use crate::error::Result;
use crate::packager::{
    BuildOrchestrator, PackageDetails, SourceType,
    inspect::{auto_fill, inspect_msi},
    utils::fs::read_text,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Auto-filled details for `source`, overridden by command line values.
pub(crate) async fn resolve_details(source: &Path, overrides: &DetailsArgs) -> Result<PackageDetails> {
    let props = if SourceType::from_path(source) == SourceType::Msi && source.is_file() {
        inspect_msi(source).await
    } else {
        BTreeMap::new()
    };

    let mut details = auto_fill(source, &props);
    overrides.apply(&mut details);

    if let Some(path) = &overrides.pre_install {
        details.pre_install_script = Some(read_text(path).await?);
    }
    Ok(details)
}

/// Builds the package and prints where it landed.
pub async fn run_build(args: &Args, build: &BuildArgs, output: &OutputManager) -> Result<i32> {
    let config = load_config(args)?;
    let mut details = resolve_details(&build.source, &build.details).await?;
    if details.detection_rule.trim().is_empty() {
        output.warn("No detection rule given; detect.ps1 will never report the app as installed")?;
    }

    output.section(&format!("Packaging {} {}", details.app_name, details.version))?;
    let (sink, printer) = event_printer(*output, false);
    let builder = BuildOrchestrator::new(&config, sink);
    let result = builder.build(&build.source, &build.output, &mut details).await;
    drop(builder);
    printer.await.ok();

    let outcome = result?;
    if !outcome.success {
        if let Some(failure) = &outcome.failure {
            output.error(&failure.to_string())?;
        }
        return Ok(1);
    }

    output.success(&format!("Package created: {}", outcome.package_path.display()))?;
    output.indent(&format!("staging: {}", outcome.staging_dir.display()))?;
    match &outcome.checksum {
        Some(checksum) => output.indent(&format!("sha256:  {}", checksum))?,
        None => output.warn("Package checksum could not be computed")?,
    }
    Ok(0)
}
