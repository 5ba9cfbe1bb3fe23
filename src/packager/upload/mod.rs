//! Intune upload.
//!
//! # Module Organization
//!
//! - `auth` - access token providers
//! - `client` - app catalog seam and the Graph implementation
//! - `metadata` - `win32LobApp` request body
//! - `orchestrator` - [`UploadOrchestrator`]
//! - `protocol` - delegate script line protocol

mod auth;
mod client;
mod metadata;
mod orchestrator;
mod protocol;

pub use auth::{ClientCredentials, GRAPH_SCOPE, StaticToken, TokenProvider};
pub use client::{AppCatalog, GraphClient};
pub use metadata::{InstallExperience, PowerShellScriptRule, ReturnCode, Win32LobApp};
pub use orchestrator::{UPLOAD_SCRIPT_NAME, UploadOrchestrator, locate_upload_script};
pub use protocol::{DelegateLine, METADATA_PROGRESS_SHARE, overall_progress};
