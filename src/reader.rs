//! reader
//!
//! The metadata accessors: commit, branch, remote, and version.
//!
//! # Contract
//!
//! Each accessor is an independent `async fn` returning a plain `String`.
//! None of them ever fails past its own boundary: a missing root, an
//! unreadable file, or content that does not match the expected structure
//! all collapse into the documented fallback — an environment override
//! where one exists, otherwise the literal `"unknown"`. Read failures are
//! logged at `warn` with the file path and the underlying error; that log
//! line is the only observable side effect of a failure.
//!
//! # Concurrency
//!
//! Each accessor performs at most one asynchronous file read and shares
//! no mutable state with the others. The two root paths are computed once
//! at construction and are read-only afterwards, so the accessors may be
//! awaited concurrently or sequentially with identical results.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::locate::{find_marker_root, resolve_git_dir};

/// Sentinel returned when a value cannot be determined.
pub const UNKNOWN: &str = "unknown";

const GIT_MARKER: &str = ".git";
const MANIFEST_MARKER: &str = "package.json";

const BRANCH_OVERRIDE_VAR: &str = "CF_PAGES_BRANCH";
const REMOTE_OVERRIDE_VAR: &str = "REPOSITORY_URL";
const VERSION_OVERRIDE_VAR: &str = "APP_VERSION";

/// Internal failure taxonomy for a single accessor read.
///
/// Never crosses the public surface; every variant resolves to the same
/// fallback behavior. The distinction exists so read failures can be
/// logged while parse failures are swallowed silently.
#[derive(Debug, Error)]
enum ReadError {
    /// No ancestor directory contained the marker.
    #[error("no ancestor directory contains the marker")]
    RootNotFound,

    /// Marker found but the target file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content does not match the expected line/field structure.
    #[error("file content does not match the expected structure")]
    Parse,
}

/// Environment overrides consulted by the accessors.
///
/// Read from the process environment once at construction and injected
/// into [`VersionInfo`], never consulted as hidden global state. Tests
/// construct the struct directly with fake values. Empty variables are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Short-circuits the branch accessor entirely when set.
    pub branch: Option<String>,
    /// Fallback for the remote accessor.
    pub remote: Option<String>,
    /// Fallback for the version accessor.
    pub version: Option<String>,
}

impl Overrides {
    /// Read the override variables from the process environment.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            branch: non_empty(BRANCH_OVERRIDE_VAR),
            remote: non_empty(REMOTE_OVERRIDE_VAR),
            version: non_empty(VERSION_OVERRIDE_VAR),
        }
    }
}

/// Minimal view of the package manifest.
#[derive(Debug, Deserialize)]
struct Manifest {
    version: String,
}

/// Repository metadata reader.
///
/// Holds the two precomputed root paths (the resolved git directory and
/// the directory containing the package manifest) plus the override set.
/// Construct with [`VersionInfo::discover`] for real use, or with
/// [`VersionInfo::new`] to inject fake roots in tests.
///
/// # Example
///
/// ```no_run
/// # async fn demo() {
/// let info = version_info::VersionInfo::discover();
/// println!("{}@{}", info.branch().await, info.commit().await);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VersionInfo {
    git_dir: Option<PathBuf>,
    manifest_root: Option<PathBuf>,
    overrides: Overrides,
}

impl VersionInfo {
    /// Build a reader with explicit roots and overrides.
    pub fn new(
        git_dir: Option<PathBuf>,
        manifest_root: Option<PathBuf>,
        overrides: Overrides,
    ) -> Self {
        Self {
            git_dir,
            manifest_root,
            overrides,
        }
    }

    /// Discover roots by upward search from the current working directory,
    /// with overrides taken from the process environment.
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(cwd) => Self::discover_from(&cwd),
            Err(err) => {
                warn!(error = %err, "cannot determine working directory");
                Self::new(None, None, Overrides::from_env())
            }
        }
    }

    /// Discover roots by upward search from `start`.
    ///
    /// Each marker is searched for once, here, not per accessor call.
    pub fn discover_from(start: &Path) -> Self {
        let git_dir =
            find_marker_root(start, GIT_MARKER).and_then(|root| resolve_git_dir(&root));
        let manifest_root = find_marker_root(start, MANIFEST_MARKER);
        Self::new(git_dir, manifest_root, Overrides::from_env())
    }

    /// The hash of the most recent commit, from the reflog.
    ///
    /// Reads `<git-dir>/logs/HEAD` and takes the second field of the last
    /// non-empty line (`<old> <new> <author> <timestamp>\t<action>`). The
    /// line format is a structural assumption about the reflog, not
    /// validated further. Falls back to `"unknown"`.
    pub async fn commit(&self) -> String {
        self.read_commit().await.unwrap_or_else(|_| UNKNOWN.to_string())
    }

    /// The current branch name.
    ///
    /// When the branch override is set it is returned without touching the
    /// filesystem. Otherwise reads `<git-dir>/HEAD` and strips the
    /// `ref: refs/heads/` prefix; a detached HEAD yields the raw hash.
    /// Falls back to `"unknown"`.
    pub async fn branch(&self) -> String {
        if let Some(branch) = &self.overrides.branch {
            return branch.clone();
        }
        match self.read_branch().await {
            Ok(branch) if !branch.is_empty() => branch,
            _ => UNKNOWN.to_string(),
        }
    }

    /// The `org/repo` path of the first remote URL in `<git-dir>/config`.
    ///
    /// SSH-style (`git@host:org/repo.git`) and http(s) URLs are reduced to
    /// their path with any trailing `.git` stripped. Falls back to the
    /// remote override, else `"unknown"`.
    pub async fn remote(&self) -> String {
        match self.read_remote().await {
            Ok(remote) => remote,
            Err(_) => self
                .overrides
                .remote
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    /// The `version` field of `<manifest-root>/package.json`.
    ///
    /// Falls back to the version override, else `"unknown"`.
    pub async fn version(&self) -> String {
        match self.read_version().await {
            Ok(version) if !version.is_empty() => version,
            _ => self
                .overrides
                .version
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    async fn read_commit(&self) -> Result<String, ReadError> {
        let log = self.read_git_file("logs/HEAD").await?;
        last_reflog_hash(&log).ok_or(ReadError::Parse)
    }

    async fn read_branch(&self) -> Result<String, ReadError> {
        let head = self.read_git_file("HEAD").await?;
        Ok(branch_from_head(&head))
    }

    async fn read_remote(&self) -> Result<String, ReadError> {
        let config = self.read_git_file("config").await?;
        let raw = config
            .lines()
            .find_map(|line| line.split_once("url = ").map(|(_, rest)| rest))
            .ok_or(ReadError::Parse)?;
        remote_path(raw).ok_or(ReadError::Parse)
    }

    async fn read_version(&self) -> Result<String, ReadError> {
        let root = self.manifest_root.as_deref().ok_or(ReadError::RootNotFound)?;
        let content = read_file(&root.join(MANIFEST_MARKER)).await?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|_| ReadError::Parse)?;
        Ok(manifest.version)
    }

    async fn read_git_file(&self, name: &str) -> Result<String, ReadError> {
        let git_dir = self.git_dir.as_deref().ok_or(ReadError::RootNotFound)?;
        read_file(&git_dir.join(name)).await
    }
}

/// Read a file to a string, logging a warning on failure.
async fn read_file(path: &Path) -> Result<String, ReadError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(source) => {
            warn!(path = %path.display(), error = %source, "cannot read metadata file");
            Err(ReadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Extract the new-commit hash from the last non-empty reflog line.
fn last_reflog_hash(log: &str) -> Option<String> {
    log.lines()
        .filter(|line| !line.is_empty())
        .last()?
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
}

/// Reduce the content of a HEAD file to a branch name.
fn branch_from_head(head: &str) -> String {
    head.strip_prefix("ref: refs/heads/")
        .unwrap_or(head)
        .trim()
        .to_string()
}

/// Reduce a remote URL to its repository path, without a `.git` suffix.
///
/// `git@host.example:org/repo.git` and `https://host.example/org/repo.git`
/// both become `org/repo`; anything else is taken verbatim. Returns `None`
/// for URLs with no extractable, non-empty path.
fn remote_path(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let path = if let Some(rest) = raw.strip_prefix("git@") {
        rest.split_once(':')?.1
    } else if raw.starts_with("http") {
        let after_scheme = raw.split_once("://")?.1;
        after_scheme.split_once('/')?.1
    } else {
        raw
    };
    let path = path.strip_suffix(".git").unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}
