//! Installer source type.

use std::path::Path;

/// Kind of Windows installer being packaged.
///
/// Decided once when the job is created (from the file extension) and carried
/// through every later stage. Script templates branch on it, because MSI
/// commands are full command lines while EXE commands are only arguments to
/// the installer itself.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_intune::packager::SourceType;
///
/// assert_eq!(SourceType::from_path("Setup.MSI"), SourceType::Msi);
/// assert_eq!(SourceType::from_path("setup.exe"), SourceType::Exe);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    /// Windows Installer database (.msi)
    Msi,
    /// Executable installer (.exe and anything that is not .msi)
    #[default]
    Exe,
}

impl SourceType {
    /// Infers the source type from a file name. Only `.msi` (any case) is MSI.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("msi") => SourceType::Msi,
            _ => SourceType::Exe,
        }
    }

    /// Template-facing name (`MSI` / `EXE`).
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Msi => "MSI",
            SourceType::Exe => "EXE",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_decides_type() {
        assert_eq!(SourceType::from_path("C:/pkgs/app.msi"), SourceType::Msi);
        assert_eq!(SourceType::from_path("app.Msi"), SourceType::Msi);
        assert_eq!(SourceType::from_path("app.exe"), SourceType::Exe);
        assert_eq!(SourceType::from_path("msi"), SourceType::Exe);
        assert_eq!(SourceType::from_path("app.msix"), SourceType::Exe);
    }
}
