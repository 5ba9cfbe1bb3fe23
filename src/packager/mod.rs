//! Intune packaging pipeline.
//!
//! Turns a Windows installer (MSI or EXE) into an `.intunewin` package,
//! uploads it to Intune, and runs the generated scripts locally under
//! elevation for verification.
//!
//! # Module Organization
//!
//! - [`builder`] - staging, script generation and IntuneWinAppUtil
//! - [`error`] - error types
//! - [`events`] - status/progress/log channel shared by every stage
//! - [`harness`] - elevated script runs with transcript tailing
//! - [`inspect`] - MSI property lookup and detail defaults
//! - [`process`] - subprocess spawning with merged output
//! - [`script`] - Handlebars deployment scripts
//! - [`settings`] - configuration and job description
//! - [`upload`] - metadata push and delegated content upload
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_intune::packager::{
//!     BuildOrchestrator, Config, EventSink, PackageDetails,
//! };
//! use std::path::Path;
//!
//! # async fn run() -> kodegen_bundler_intune::packager::Result<()> {
//! let config = Config::load(&Config::default_path()?)?;
//! let (sink, _events) = EventSink::channel();
//! let mut details = PackageDetails {
//!     app_name: "Contoso Agent".into(),
//!     publisher: "Contoso".into(),
//!     version: "4.2.0".into(),
//!     ..Default::default()
//! };
//!
//! let outcome = BuildOrchestrator::new(&config, sink)
//!     .build(Path::new("agent.msi"), Path::new("out"), &mut details)
//!     .await?;
//! assert!(outcome.success);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod events;
pub mod harness;
pub mod inspect;
pub mod process;
pub mod script;
pub mod settings;
pub mod upload;
pub mod utils;

pub use builder::{BuildOrchestrator, BuildOutcome};
pub use error::{Context, Error, ErrorExt, Result};
pub use events::{Event, EventSink};
pub use harness::TestHarness;
pub use script::{ScriptGenerator, ScriptKind};
pub use settings::{Config, PackageDetails, SourceType};
pub use upload::UploadOrchestrator;
