//! Kodegen Bundler Intune - Win32 app packager for Microsoft Intune.
//!
//! This binary packages MSI/EXE installers into `.intunewin` files, uploads
//! them to Intune and runs their scripts elevated for testing.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match kodegen_bundler_intune::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            for hint in e.recovery_suggestions() {
                eprintln!("  {}", hint);
            }
            1
        }
    };

    process::exit(exit_code);
}
