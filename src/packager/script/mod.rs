//! Deployment script generation.
//!
//! Renders `install.ps1`, `uninstall.ps1` and `detect.ps1` from Handlebars
//! templates and a [`PackageDetails`] record.
//!
//! # Module Organization
//!
//! - `template` - embedded template sources

pub(crate) mod template;

use crate::packager::{
    error::{Error, ErrorExt, Result},
    settings::{PackageDetails, SourceType},
    utils::fs::write_utf8_bom,
};
use handlebars::Handlebars;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

/// The three generated scripts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ScriptKind {
    /// `install.ps1`, the package's setup file
    Install,
    /// `uninstall.ps1`
    Uninstall,
    /// `detect.ps1`, also uploaded as the detection rule
    Detect,
}

impl ScriptKind {
    /// All kinds in generation order.
    pub const ALL: [ScriptKind; 3] = [ScriptKind::Install, ScriptKind::Uninstall, ScriptKind::Detect];

    /// Generated file name inside the staging directory.
    pub fn file_name(self) -> &'static str {
        match self {
            ScriptKind::Install => "install.ps1",
            ScriptKind::Uninstall => "uninstall.ps1",
            ScriptKind::Detect => "detect.ps1",
        }
    }

    /// Template resource name.
    pub fn template_name(self) -> &'static str {
        match self {
            ScriptKind::Install => "install.ps1.hbs",
            ScriptKind::Uninstall => "uninstall.ps1.hbs",
            ScriptKind::Detect => "detect.ps1.hbs",
        }
    }

    fn embedded_template(self) -> &'static str {
        match self {
            ScriptKind::Install => template::INSTALL_TEMPLATE,
            ScriptKind::Uninstall => template::UNINSTALL_TEMPLATE,
            ScriptKind::Detect => template::DETECT_TEMPLATE,
        }
    }

    /// Parses `install`, `uninstall` or `detect` (with or without `.ps1`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim_end_matches(".ps1").to_ascii_lowercase().as_str() {
            "install" => Some(ScriptKind::Install),
            "uninstall" => Some(ScriptKind::Uninstall),
            "detect" => Some(ScriptKind::Detect),
            _ => None,
        }
    }
}

/// Script generator.
///
/// Uses the embedded templates unless a templates directory is configured.
#[derive(Debug, Clone, Default)]
pub struct ScriptGenerator {
    templates_dir: Option<PathBuf>,
}

impl ScriptGenerator {
    /// Generator using the embedded templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator loading `<dir>/<kind>.ps1.hbs`.
    pub fn with_templates_dir(dir: Option<PathBuf>) -> Self {
        Self { templates_dir: dir }
    }

    /// Renders one script into `output_dir`, overwriting it if present.
    ///
    /// Returns the path of the written file.
    pub async fn render(
        &self,
        kind: ScriptKind,
        details: &PackageDetails,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let content = self.render_to_string(kind, details).await?;
        let path = output_dir.join(kind.file_name());
        write_utf8_bom(&path, &content).await?;
        log::debug!("Generated {}", path.display());
        Ok(path)
    }

    /// Renders one script to a string.
    pub async fn render_to_string(&self, kind: ScriptKind, details: &PackageDetails) -> Result<String> {
        let source = self.template_source(kind).await?;
        render_template(kind.template_name(), &source, &template_context(details))
    }

    async fn template_source(&self, kind: ScriptKind) -> Result<String> {
        let Some(dir) = &self.templates_dir else {
            return Ok(kind.embedded_template().to_string());
        };

        let path = dir.join(kind.template_name());
        if !path.is_file() {
            return Err(Error::Template(format!(
                "template {} not found in {}",
                kind.template_name(),
                dir.display()
            )));
        }
        tokio::fs::read_to_string(&path)
            .await
            .fs_context("reading script template", &path)
    }
}

/// Builds the substitution context for the script templates.
///
/// MSI commands are full command lines and go under `installCmd` /
/// `uninstallCmd`. EXE commands are arguments to the staged installer and go
/// under `installCmdArgs` / `uninstallCmdArgs`. A key for the other source
/// type is never present, so a template referencing it fails to render.
pub fn template_context(details: &PackageDetails) -> BTreeMap<&'static str, String> {
    let mut data = BTreeMap::new();

    data.insert("appName", details.app_name.clone());
    data.insert("version", details.version.clone());
    data.insert("publisher", details.publisher.clone());
    data.insert("sourceType", details.source_type.as_str().to_string());
    data.insert("sourceFileName", details.source_file_name.clone());
    data.insert("sourceFileLiteral", ps_single_quote(&details.source_file_name));

    match details.source_type {
        SourceType::Msi => {
            data.insert("installCmd", details.install_cmd.clone());
            data.insert("uninstallCmd", details.uninstall_cmd.clone());
        }
        SourceType::Exe => {
            data.insert("installCmdArgs", details.install_cmd.clone());
            data.insert("uninstallCmdArgs", details.uninstall_cmd.clone());
        }
    }

    data.insert("detectionRule", details.detection_rule.clone());
    data.insert("preInstallScript", details.pre_install_body().to_string());

    data
}

/// Quotes a value for a single-quoted PowerShell string literal.
pub fn ps_single_quote(value: &str) -> String {
    value.replace('\'', "''")
}

/// Renders a Handlebars template in strict mode without HTML escaping.
pub(crate) fn render_template<T: Serialize>(name: &str, source: &str, data: &T) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(name, source)
        .map_err(|e| Error::Template(format!("failed to register {}: {}", name, e)))?;

    handlebars
        .render(name, data)
        .map_err(|e| Error::Template(format!("failed to render {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msi_details() -> PackageDetails {
        PackageDetails {
            app_name: "Contoso Agent".into(),
            publisher: "Contoso".into(),
            version: "4.2.0".into(),
            install_cmd: "msiexec /i \"agent.msi\" /qn /norestart".into(),
            uninstall_cmd: "msiexec /x {11111111-2222-3333-4444-555555555555} /qn".into(),
            detection_rule: "{11111111-2222-3333-4444-555555555555}".into(),
            ..Default::default()
        }
        .with_source("/drop/agent.msi")
    }

    fn exe_details() -> PackageDetails {
        PackageDetails {
            app_name: "Tool".into(),
            publisher: "Fabrikam".into(),
            version: "1.0".into(),
            install_cmd: "/S /D=C:\\Tool".into(),
            uninstall_cmd: "/S /uninstall".into(),
            detection_rule: "C:\\Tool\\tool.exe".into(),
            ..Default::default()
        }
        .with_source("/drop/tool-setup.exe")
    }

    #[test]
    fn msi_context_uses_command_keys() {
        let data = template_context(&msi_details());
        assert_eq!(data["installCmd"], "msiexec /i \"agent.msi\" /qn /norestart");
        assert!(data.contains_key("uninstallCmd"));
        assert!(!data.contains_key("installCmdArgs"));
        assert!(!data.contains_key("uninstallCmdArgs"));
        assert_eq!(data["sourceType"], "MSI");
    }

    #[test]
    fn exe_context_uses_argument_keys() {
        let data = template_context(&exe_details());
        assert_eq!(data["installCmdArgs"], "/S /D=C:\\Tool");
        assert_eq!(data["uninstallCmdArgs"], "/S /uninstall");
        assert!(!data.contains_key("installCmd"));
        assert_eq!(data["preInstallScript"], "");
    }

    #[tokio::test]
    async fn msi_scripts_embed_commands_verbatim() {
        let generator = ScriptGenerator::new();
        let details = msi_details();

        let install = generator.render_to_string(ScriptKind::Install, &details).await.unwrap();
        assert!(install.contains(&details.install_cmd));
        assert!(install.contains("cmd.exe"));

        let uninstall = generator
            .render_to_string(ScriptKind::Uninstall, &details)
            .await
            .unwrap();
        assert!(uninstall.contains(&details.uninstall_cmd));

        let detect = generator.render_to_string(ScriptKind::Detect, &details).await.unwrap();
        assert!(detect.contains("$ProductCode = '{11111111-2222-3333-4444-555555555555}'"));
    }

    #[tokio::test]
    async fn exe_scripts_invoke_staged_installer() {
        let generator = ScriptGenerator::new();
        let details = exe_details();

        let install = generator.render_to_string(ScriptKind::Install, &details).await.unwrap();
        assert!(install.contains("/S /D=C:\\Tool"));
        assert!(install.contains("-FilePath $Installer"));
        assert!(install.contains("'tool-setup.exe'"));

        let detect = generator.render_to_string(ScriptKind::Detect, &details).await.unwrap();
        assert!(detect.contains("C:\\Tool\\tool.exe"));
        assert!(!detect.contains("$ProductCode"));
    }

    #[tokio::test]
    async fn pre_install_script_is_included() {
        let mut details = exe_details();
        details.pre_install_script = Some("Stop-Service -Name ToolSvc".into());
        let install = ScriptGenerator::new()
            .render_to_string(ScriptKind::Install, &details)
            .await
            .unwrap();
        assert!(install.contains("Stop-Service -Name ToolSvc"));
    }

    #[tokio::test]
    async fn missing_template_file_is_template_error() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScriptGenerator::with_templates_dir(Some(dir.path().to_path_buf()));
        let err = generator
            .render(ScriptKind::Install, &msi_details(), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert!(!dir.path().join("install.ps1").exists());
    }

    #[tokio::test]
    async fn template_referencing_other_branch_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("install.ps1.hbs"), "{{installCmd}}").unwrap();
        let generator = ScriptGenerator::with_templates_dir(Some(dir.path().to_path_buf()));

        let err = generator
            .render_to_string(ScriptKind::Install, &exe_details())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));

        let rendered = generator
            .render_to_string(ScriptKind::Install, &msi_details())
            .await
            .unwrap();
        assert_eq!(rendered, "msiexec /i \"agent.msi\" /qn /norestart");
    }

    #[tokio::test]
    async fn quote_in_installer_name_stays_inside_the_literal() {
        let details = PackageDetails {
            app_name: "Agent".into(),
            install_cmd: "/S".into(),
            uninstall_cmd: "/S".into(),
            ..Default::default()
        }
        .with_source("/drop/O'Brien Setup.exe");
        let generator = ScriptGenerator::default();

        for kind in [ScriptKind::Install, ScriptKind::Uninstall] {
            let script = generator.render_to_string(kind, &details).await.unwrap();
            assert!(
                script.contains("Join-Path $ScriptDir 'O''Brien Setup.exe'"),
                "{}",
                script
            );
        }
    }

    #[test]
    fn parse_kind_names() {
        assert_eq!(ScriptKind::parse("install"), Some(ScriptKind::Install));
        assert_eq!(ScriptKind::parse("Detect.ps1"), Some(ScriptKind::Detect));
        assert_eq!(ScriptKind::parse("repair"), None);
    }
}
