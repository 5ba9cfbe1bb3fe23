//! Delegate upload script output protocol.
//!
//! The upload script reports back through prefixed stdout lines:
//!
//! - `STATUS: <message>` - phase description
//! - `... PROGRESS: <n>% ...` - transfer percentage (may appear anywhere in the line)
//! - `ERROR: <message>` - fault annotation; the exit code decides failure
//!
//! Anything else is plain output. Parsing is independent of process handling
//! so it can be exercised with arbitrary input.

/// Share of overall progress taken by metadata creation.
///
/// The delegated transfer fills the remaining range. The split is a heuristic,
/// not a measured ratio; it can be tuned freely.
pub const METADATA_PROGRESS_SHARE: f64 = 0.15;

const STATUS_PREFIX: &str = "STATUS: ";
const PROGRESS_MARKER: &str = "PROGRESS: ";
const ERROR_PREFIX: &str = "ERROR: ";

/// One classified output line.
#[derive(Clone, Debug, PartialEq)]
pub enum DelegateLine {
    /// Status message with the prefix removed
    Status(String),
    /// Transfer percentage, clamped to `[0, 100]`
    Progress(f64),
    /// Fault annotation with the prefix removed
    Error(String),
    /// Unrecognized or malformed line, unmodified
    Raw(String),
}

impl DelegateLine {
    /// Classifies a single line.
    ///
    /// Precedence follows the script's conventions: a `STATUS: ` prefix wins
    /// over an embedded progress marker, which wins over an `ERROR: ` prefix.
    /// A progress marker without a number is treated as [`DelegateLine::Raw`].
    ///
    /// # Examples
    ///
    /// ```
    /// use kodegen_bundler_intune::packager::upload::DelegateLine;
    ///
    /// assert_eq!(DelegateLine::parse("PROGRESS: 50%"), DelegateLine::Progress(50.0));
    /// assert_eq!(
    ///     DelegateLine::parse("STATUS: syncing"),
    ///     DelegateLine::Status("syncing".into())
    /// );
    /// ```
    pub fn parse(line: &str) -> Self {
        if let Some(message) = line.strip_prefix(STATUS_PREFIX) {
            return DelegateLine::Status(message.to_string());
        }

        if let Some((_, rest)) = line.split_once(PROGRESS_MARKER) {
            let number = rest.split('%').next().unwrap_or_default().trim();
            return match number.parse::<f64>() {
                Ok(pct) if pct.is_finite() => DelegateLine::Progress(pct.clamp(0.0, 100.0)),
                _ => DelegateLine::Raw(line.to_string()),
            };
        }

        if let Some(message) = line.strip_prefix(ERROR_PREFIX) {
            return DelegateLine::Error(message.to_string());
        }

        DelegateLine::Raw(line.to_string())
    }
}

/// Maps a transfer percentage into the overall progress range.
///
/// `0%` lands at [`METADATA_PROGRESS_SHARE`], `100%` at `1.0`.
pub fn overall_progress(pct: f64) -> f64 {
    METADATA_PROGRESS_SHARE + (1.0 - METADATA_PROGRESS_SHARE) * (pct.clamp(0.0, 100.0) / 100.0)
}
