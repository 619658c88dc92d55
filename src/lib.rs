//! version-info - Repository metadata from local files
//!
//! Discovers the current commit hash, branch name, remote URL, and package
//! version by walking up the filesystem from the working directory to find
//! a `.git` directory and a `package.json` manifest, then parsing small
//! local files. No version-control client is involved and nothing is ever
//! written.
//!
//! # Architecture
//!
//! - [`locate`] - Upward directory search for marker files
//! - [`reader`] - The four metadata accessors and their fallback logic
//!
//! # Contract
//!
//! Every accessor resolves to a real value or the literal `"unknown"`;
//! none of them returns an error or panics. Failed reads are reported as
//! `tracing` warnings and nothing else.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() {
//! use version_info::VersionInfo;
//!
//! let info = VersionInfo::discover();
//! println!(
//!     "{} on {} ({}) v{}",
//!     info.commit().await,
//!     info.branch().await,
//!     info.remote().await,
//!     info.version().await,
//! );
//! # }
//! ```

pub mod locate;
pub mod reader;

pub use reader::{Overrides, VersionInfo, UNKNOWN};
