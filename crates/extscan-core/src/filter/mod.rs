//! Line filters.
//!
//! A filter decides, for one input line, whether the line is kept. Both
//! built-in filters work the same way up to the final check: resolve the
//! line to an extension directory, load its manifest, then inspect the
//! manifest. Failing to resolve or load is not an error; it yields a
//! [`Verdict`] that does not match and carries a warning.
//!
//! The set of filters is closed. [`Filter`] has one variant per kind and is
//! built once at startup, before any input is read.

mod manifest_key;
mod permissions;

use std::future::Future;

pub use manifest_key::ManifestKeyFilter;
pub use permissions::PermissionFilter;

use crate::manifest::{self, Manifest};
use crate::resolve::extension_dir;

/// Warning recorded when a line does not resolve to an extension directory.
pub const NOT_AN_EXTENSION_DIR: &str = "not an extension directory";

/// Outcome of evaluating a filter against one line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the line is kept.
    pub matched: bool,
    /// Warnings to report for this line, in the order they were recorded.
    pub warnings: Vec<String>,
}

impl Verdict {
    /// A verdict with no warnings.
    pub fn new(matched: bool) -> Self {
        Self {
            matched,
            warnings: Vec::new(),
        }
    }

    /// A non-matching verdict carrying one warning.
    pub fn warned(warning: impl Into<String>) -> Self {
        Self {
            matched: false,
            warnings: vec![warning.into()],
        }
    }
}

impl From<bool> for Verdict {
    fn from(matched: bool) -> Self {
        Self::new(matched)
    }
}

/// Something the pipeline can evaluate lines against.
///
/// An `Err` is a hard failure: the pipeline stops reading input and reports
/// it. Conditions that only mean "cannot tell" belong in
/// [`Verdict::warnings`].
pub trait LineFilter {
    fn evaluate(&self, line: &str) -> impl Future<Output = anyhow::Result<Verdict>>;
}

/// The built-in filters.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Match on declared permissions.
    Permissions(PermissionFilter),
    /// Match a manifest value against regular expressions.
    ManifestKey(ManifestKeyFilter),
}

impl Filter {
    /// The kind name of this filter.
    pub fn kind(&self) -> &'static str {
        match self {
            Filter::Permissions(_) => PermissionFilter::KIND,
            Filter::ManifestKey(_) => ManifestKeyFilter::KIND,
        }
    }

    /// Evaluates the filter against a parsed manifest.
    pub fn matches(&self, manifest: &Manifest) -> bool {
        match self {
            Filter::Permissions(filter) => filter.matches(manifest),
            Filter::ManifestKey(filter) => filter.matches(manifest),
        }
    }
}

impl LineFilter for Filter {
    async fn evaluate(&self, line: &str) -> anyhow::Result<Verdict> {
        Ok(match manifest_for_line(line).await {
            Ok(manifest) => Verdict::new(self.matches(&manifest)),
            Err(warning) => Verdict::warned(warning),
        })
    }
}

/// Resolves `line` to its extension directory and loads the manifest there.
///
/// The error is the warning text to record for the line.
async fn manifest_for_line(line: &str) -> Result<Manifest, String> {
    let dir = extension_dir(line).ok_or_else(|| NOT_AN_EXTENSION_DIR.to_string())?;
    manifest::load(dir).await.map_err(|e| e.to_string())
}
