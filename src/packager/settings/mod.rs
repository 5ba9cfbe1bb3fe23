//! Configuration and job description types.
//!
//! - [`Config`] - persisted settings (tenant, client, tool path, overrides)
//! - [`PackageDetails`] - one packaging job
//! - [`SourceType`] - MSI / EXE decision made at job creation

mod config;
mod package;
mod source;

pub use config::{Config, DEFAULT_GRAPH_BASE_URL};
pub use package::PackageDetails;
pub use source::SourceType;
