//! Package details for one packaging job.

use super::SourceType;
use std::path::{Path, PathBuf};

/// Description of one packaging job.
///
/// Built once per job and handed from stage to stage. The build stage fills in
/// [`source_type`](Self::source_type), [`source_file_name`](Self::source_file_name)
/// and [`detection_script`](Self::detection_script); the upload stage reads them.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_intune::packager::{PackageDetails, SourceType};
///
/// let details = PackageDetails {
///     app_name: "7-Zip".into(),
///     publisher: "Igor Pavlov".into(),
///     version: "23.01".into(),
///     install_cmd: "msiexec /i \"7z.msi\" /qn".into(),
///     ..Default::default()
/// }
/// .with_source("C:/drop/7z.msi");
///
/// assert_eq!(details.source_type, SourceType::Msi);
/// assert_eq!(details.source_file_name, "7z.msi");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageDetails {
    /// Full path of the installer as selected by the user.
    pub source_path: PathBuf,

    /// File name component of [`source_path`](Self::source_path).
    pub source_file_name: String,

    /// MSI or EXE, inferred from the extension.
    pub source_type: SourceType,

    /// Display name in Intune.
    pub app_name: String,

    /// Publisher (also used as developer).
    pub publisher: String,

    /// Display version.
    pub version: String,

    /// Free-form description.
    ///
    /// Default: empty (upload falls back to "publisher - version")
    pub description: String,

    /// Install command line (MSI) or installer arguments (EXE).
    pub install_cmd: String,

    /// Uninstall command line (MSI) or installer arguments (EXE).
    pub uninstall_cmd: String,

    /// Detection rule: a product code for MSI, a path for EXE.
    pub detection_rule: String,

    /// Rendered `detect.ps1` body, read back after generation.
    pub detection_script: Option<String>,

    /// PowerShell run before the installer.
    pub pre_install_script: Option<String>,
}

impl PackageDetails {
    /// Sets the source path and derives file name and source type from it.
    pub fn with_source(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        self.source_path = path.to_path_buf();
        self.source_file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.source_type = SourceType::from_path(path);
        self
    }

    /// Description sent to the remote service.
    pub fn display_description(&self) -> String {
        if self.description.trim().is_empty() {
            format!("{} - {}", self.publisher, self.version)
        } else {
            self.description.clone()
        }
    }

    /// Pre-install body, empty when not set.
    pub fn pre_install_body(&self) -> &str {
        self.pre_install_script.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_falls_back_to_publisher_and_version() {
        let mut details = PackageDetails {
            publisher: "Contoso".into(),
            version: "2.1".into(),
            ..Default::default()
        };
        assert_eq!(details.display_description(), "Contoso - 2.1");

        details.description = "Line of business app".into();
        assert_eq!(details.display_description(), "Line of business app");
    }

    #[test]
    fn with_source_derives_fields() {
        let details = PackageDetails::default().with_source("/drop/Setup.exe");
        assert_eq!(details.source_file_name, "Setup.exe");
        assert_eq!(details.source_type, SourceType::Exe);
        assert_eq!(details.pre_install_body(), "");
    }
}
