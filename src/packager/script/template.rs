//! Embedded PowerShell script templates.
//!
//! Handlebars sources compiled into the binary. The install, uninstall and
//! detect templates can be replaced at runtime through a templates directory.

/// Install script template (`install.ps1`).
pub const INSTALL_TEMPLATE: &str = include_str!("templates/install.ps1.hbs");

/// Uninstall script template (`uninstall.ps1`).
pub const UNINSTALL_TEMPLATE: &str = include_str!("templates/uninstall.ps1.hbs");

/// Detection script template (`detect.ps1`).
pub const DETECT_TEMPLATE: &str = include_str!("templates/detect.ps1.hbs");

/// Transcript-capturing wrapper used by the test harness.
pub const TEST_RUNNER_TEMPLATE: &str = include_str!("templates/test_runner.ps1.hbs");
