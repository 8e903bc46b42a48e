//! Cross-cutting utilities.
//!
//! - [`progress`] — indicatif-backed download progress bars with a global
//!   disable switch for CI and scripted runs.
//! - [`url`] — artifact file-name derivation from download URLs.

pub mod progress;
pub mod url;
