//! Self-update support for a host-installed add-on.
//!
//! This crate holds the logic that is independent of any particular host:
//! - Version descriptor parsing and comparison.
//! - Update preferences and check intervals.
//! - The update checker state machine and source replacement.
//! - The host seam used to locate and reload the add-on.
//! - The periodic check loop.

pub mod checker;
mod download;
mod error;
pub mod host;
mod preferences;
pub mod schedule;
mod version;

/// Update checker, its state and user-facing status reports.
pub use checker::{
    CheckOutcome, StatusLevel, StatusMessage, UpdateChecker, UpdateEndpoints, UpdateState,
};
/// Log-safe URL rendering.
pub use download::redact_url;
/// Error types for checks, downloads and host calls.
pub use error::{HostError, UpdateError};
/// Host seam and the command-driven host.
pub use host::{AddonHost, CommandHost};
/// User preferences controlling auto-update and the check cadence.
pub use preferences::{CheckInterval, UpdatePreferences};
/// Periodic check loop.
pub use schedule::{FIRST_CHECK_DELAY, run_periodic};
/// Add-on version model.
pub use version::{Version, VersionParseError};
