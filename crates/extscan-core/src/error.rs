//! Error types for manifest loading and filter construction.
//!
//! `ManifestError` is a soft error: a predicate turns it into a warning and a
//! non-match. `FilterError` is raised while building a filter from its
//! arguments and aborts the run before any input is read.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from reading and parsing `manifest.json`.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read (missing, unreadable, not UTF-8).
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid JSON, even after stripping comments.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest parsed, but its top-level value is not an object.
    #[error("{} is not a JSON object (found {found})", path.display())]
    NotAnObject { path: PathBuf, found: &'static str },
}

/// Errors from constructing a filter out of command-line arguments.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The permissions filter was given no groups.
    #[error("at least one permission group is required")]
    NoPermissionGroups,

    /// A permission group contains no permission names.
    #[error("permission group '{group}' is empty")]
    EmptyPermissionGroup { group: String },

    /// The manifest key path is empty.
    #[error("manifest key path must not be empty")]
    EmptyKeyPath,

    /// The manifest key path contains an empty segment (`a..b`, `.a`, `a.`).
    #[error("manifest key path '{key_path}' contains an empty segment")]
    EmptyKeySegment { key_path: String },

    /// The manifest filter was given no patterns.
    #[error("at least one pattern is required")]
    NoPatterns,

    /// A pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
