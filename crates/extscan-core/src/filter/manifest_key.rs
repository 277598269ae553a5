//! Manifest key pattern filter.

use std::borrow::Cow;

use regex::Regex;
use serde_json::Value;

use crate::error::FilterError;
use crate::manifest::Manifest;

/// Keeps extensions whose manifest value at a dotted key path matches any of
/// a set of regular expressions.
///
/// Patterns search anywhere in the value (`is_match`), so anchor them with
/// `^`/`$` for whole-value matches. Non-string leaves are matched against
/// their JSON text: `42`, `true`, `["a","b"]`.
#[derive(Debug, Clone)]
pub struct ManifestKeyFilter {
    segments: Vec<String>,
    patterns: Vec<Regex>,
}

impl ManifestKeyFilter {
    pub const KIND: &'static str = "manifest";

    /// Validates the key path and compiles the patterns.
    pub fn new<S: AsRef<str>>(key_path: &str, patterns: &[S]) -> Result<Self, FilterError> {
        if key_path.is_empty() {
            return Err(FilterError::EmptyKeyPath);
        }
        let segments: Vec<String> = key_path.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(FilterError::EmptyKeySegment {
                key_path: key_path.to_string(),
            });
        }

        if patterns.is_empty() {
            return Err(FilterError::NoPatterns);
        }
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            segments,
            patterns,
        })
    }

    /// Looks up the key path and tests the value against the patterns.
    pub fn matches(&self, manifest: &Manifest) -> bool {
        match self.lookup(manifest) {
            Some(value) => {
                let text = match_text(value);
                self.patterns.iter().any(|re| re.is_match(&text))
            }
            None => false,
        }
    }

    /// Walks the key path. Objects are indexed by key, arrays by a decimal
    /// index; `null` or a missing step ends the walk.
    fn lookup<'a>(&self, manifest: &'a Manifest) -> Option<&'a Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = manifest.get(first)?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        (!current.is_null()).then_some(current)
    }
}

fn match_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}
