//! Intune Win32 app packager library.
//!
//! This library provides the pipeline behind the `kodegen_bundler_intune` CLI:
//! - staging an MSI or EXE and generating its install/uninstall/detect scripts
//! - wrapping the staging directory into an `.intunewin` package
//! - uploading the package to Microsoft Intune
//! - running the generated scripts elevated for local verification
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod packager;

// Re-export commonly used types
pub use error::{CliError, PackagerError, Result};
