//! Build orchestration and coordination.
//!
//! This module provides the [`BuildOrchestrator`] that turns an installer into
//! an `.intunewin` package.
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA256 checksum of the produced package
//! - [`orchestrator`] - [`BuildOrchestrator`] and the staging steps
//! - [`packaging`] - IntuneWinAppUtil invocation
//! - [`tool_detection`] - packaging tool lookup

mod checksum;
mod orchestrator;
mod packaging;
mod tool_detection;

pub use checksum::calculate_sha256;
pub use orchestrator::{
    BuildOrchestrator, BuildOutcome, HARNESS_ARTIFACTS, PACKAGE_FILE_NAME, PROGRESS_SCRIPTS,
    PROGRESS_STAGED, PROGRESS_WORKSPACE, SETUP_FILE_NAME, STAGING_DIR_NAME,
};
pub use packaging::run_intunewin_util;
pub use tool_detection::{ensure_tool_exists, resolve_tool};
