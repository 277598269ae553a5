//! extscan core library.
//!
//! This crate provides the pieces behind `extscan filter`: mapping an input
//! path to the extension directory it lives in, loading that directory's
//! `manifest.json`, evaluating a predicate against the manifest, and the
//! ordered concurrent pipeline that drives predicates over a stream of lines.
//!
//! # Example
//!
//! ```
//! use extscan_core::resolve::extension_dir;
//!
//! let hash = "a".repeat(64);
//! let path = format!("/srv/crx/5/{hash}/js/background.js");
//! assert_eq!(extension_dir(&path), Some(format!("/srv/crx/5/{hash}").as_str()));
//! assert_eq!(extension_dir("/tmp/not/an/extension"), None);
//! ```

pub mod error;
pub mod filter;
pub mod manifest;
pub mod pipeline;
pub mod resolve;

pub use error::{FilterError, ManifestError};
pub use filter::{
    Filter, LineFilter, ManifestKeyFilter, PermissionFilter, Verdict, NOT_AN_EXTENSION_DIR,
};
pub use manifest::Manifest;
pub use pipeline::{Drained, Pipeline, PipelineStats};
