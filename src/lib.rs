//! aurup - automated PKGBUILD updater
//!
//! aurup keeps Arch packaging recipes for third-party binary releases in
//! sync with upstream: it discovers the latest version from each vendor's
//! metadata, downloads the artifacts for every supported CPU architecture
//! under bounded concurrency with retry/backoff, verifies them by hash,
//! and rewrites the recipe's version/checksum/source fields in place.
//! Each run is stateless except for the files it rewrites.
//!
//! # Architecture Overview
//!
//! The update pipeline per package is an explicit state machine:
//!
//! ```text
//! fetch metadata -> compare versions -> download per arch -> verify -> mutate recipe -> save
//! ```
//!
//! Partial failure is first-class: one architecture failing to resolve or
//! download never blocks its siblings, and one package failing never
//! blocks another. Two nested concurrency caps apply — a package-level
//! cap for multi-package runs, and a per-package semaphore over artifact
//! downloads.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface (`list`, `update`)
//! - [`config`] - YAML configuration loading and validation
//! - [`core`] - Update orchestration and the error taxonomy
//! - [`download`] - Concurrent downloader with retry/backoff
//! - [`fetch`] - Network capability boundary (`fetch_text` / `open_stream`)
//! - [`hash`] - Streaming digest computation and verification
//! - [`parsers`] - Per-vendor version/URL extractors
//! - [`pkgbuild`] - In-memory PKGBUILD field editing
//! - [`version`] - Segment-wise version comparison
//! - [`models`] - Shared data models ([`models::Arch`])
//! - [`utils`] - Progress bars and URL helpers
//!
//! # Configuration (config.yaml)
//!
//! ```yaml
//! settings:
//!   download:
//!     max_concurrent: 3
//!     max_retries: 3
//! packages:
//!   linuxqq:
//!     name: linuxqq
//!     fetch_url: https://im.qq.com/rainbow/linuxQQDownload
//!     parser: qq
//!     pkgbuild: pkgbuilds/linuxqq/PKGBUILD
//!     arch: [x86_64, aarch64, loong64, mips64el]
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # List configured packages (no network)
//! aurup list
//!
//! # Update one package
//! aurup update linuxqq
//!
//! # Update everything that is enabled (also the default with no args)
//! aurup update
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod download;
pub mod fetch;
pub mod hash;
pub mod models;
pub mod parsers;
pub mod pkgbuild;
pub mod utils;
pub mod version;
