//! Manifest loading.
//!
//! Reads `manifest.json` from an extension directory and parses it into a
//! JSON object. Real-world manifests are not always strict JSON, so a leading
//! byte-order mark is dropped and, if strict parsing fails, parsing is retried
//! once with `//` and `/* */` comments blanked out.
//!
//! Nothing is cached: every call re-reads and re-parses the file.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::ManifestError;

/// File name of the manifest inside an extension directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// A parsed manifest: the top-level JSON object.
pub type Manifest = Map<String, Value>;

/// Loads and parses `<dir>/manifest.json`.
pub async fn load(dir: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let path = dir.as_ref().join(MANIFEST_FILE_NAME);
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
    parse(&text, &path)
}

/// Parses manifest text. `path` is only used for error messages.
pub fn parse(text: &str, path: &Path) -> Result<Manifest, ManifestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(strict) => {
            if !text.contains('/') {
                return Err(ManifestError::Parse {
                    path: path.to_path_buf(),
                    source: strict,
                });
            }
            tracing::trace!(path = %path.display(), "retrying manifest parse without comments");
            serde_json::from_str::<Value>(&strip_comments(text)).map_err(|source| {
                ManifestError::Parse {
                    path: path.to_path_buf(),
                    source,
                }
            })?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ManifestError::NotAnObject {
            path: path.to_path_buf(),
            found: json_type_name(&other),
        }),
    }
}

/// Blanks out `//` line comments and `/* */` block comments.
///
/// Comment characters are replaced with spaces (line breaks are kept) so that
/// error positions still point into the original text. Comment markers inside
/// string literals are left alone. An unterminated block comment runs to the
/// end of the input.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                out.push(' ');
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                    out.push(blank(next));
                }
            }
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                let mut prev = None;
                for next in chars.by_ref() {
                    out.push(blank(next));
                    if prev == Some('*') && next == '/' {
                        break;
                    }
                    prev = Some(next);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn blank(c: char) -> char {
    if c == '\n' || c == '\r' {
        c
    } else {
        ' '
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
