//! Core orchestration types.
//!
//! - [`error`] — the typed failure taxonomy for package updates.
//! - [`updater`] — the per-package update state machine and multi-package
//!   fan-out.

pub mod error;
pub mod updater;

pub use error::UpdateError;
pub use updater::{PackageUpdater, UpdateReport, UpdateState, UpdateStatus};
