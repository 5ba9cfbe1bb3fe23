//! Persisted packager configuration.

use crate::packager::error::{Error, ErrorExt, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Microsoft Graph endpoint (the beta surface exposes win32LobApp).
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/beta";

/// File name of the config file inside the config directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Packager configuration.
///
/// Loaded once by the caller and passed into each orchestrator; nothing in
/// the packager reads it from a global location.
///
/// # Configuration
///
/// Stored as TOML at `<config dir>/kodegen-intune/config.toml`:
///
/// ```toml
/// tenant_id = "00000000-0000-0000-0000-000000000000"
/// client_id = "11111111-1111-1111-1111-111111111111"
/// tool_path = 'C:\Tools\IntuneWinAppUtil.exe'
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Entra ID tenant identifier.
    pub tenant_id: String,

    /// App registration (client) identifier.
    pub client_id: String,

    /// Path to `IntuneWinAppUtil.exe`.
    pub tool_path: String,

    /// Client secret for the client-credentials flow.
    ///
    /// Default: None (a token must be supplied directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Graph API base URL.
    ///
    /// Default: None ([`DEFAULT_GRAPH_BASE_URL`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_base_url: Option<String>,

    /// Explicit location of the delegate upload script.
    ///
    /// Default: None (looked up next to the executable, then in the working directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_script: Option<PathBuf>,

    /// Directory with `install.ps1.hbs`, `uninstall.ps1.hbs` and `detect.ps1.hbs`.
    ///
    /// Default: None (embedded templates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("kodegen-intune").join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::Configuration("no user config directory available".into()))
    }

    /// Loads configuration; a missing file yields the empty default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).fs_context("reading config file", path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Configuration(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Writes configuration, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).fs_context("creating config directory", parent)?;
        }
        let content = toml::to_string(self)
            .map_err(|e| Error::Configuration(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).fs_context("writing config file", path)
    }

    /// True when tenant, client and tool path are all set.
    pub fn is_setup_complete(&self) -> bool {
        !self.tenant_id.is_empty() && !self.client_id.is_empty() && !self.tool_path.is_empty()
    }

    /// Tenant and client id, or a configuration error when either is empty.
    pub fn require_credentials(&self) -> Result<(&str, &str)> {
        if self.tenant_id.is_empty() || self.client_id.is_empty() {
            return Err(Error::Configuration(
                "tenant id and client id are not configured (run `setup`)".into(),
            ));
        }
        Ok((&self.tenant_id, &self.client_id))
    }

    /// Graph base URL without a trailing slash.
    pub fn graph_base_url(&self) -> &str {
        self.graph_base_url
            .as_deref()
            .unwrap_or(DEFAULT_GRAPH_BASE_URL)
            .trim_end_matches('/')
    }
}
