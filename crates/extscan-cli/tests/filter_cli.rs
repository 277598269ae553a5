//! End-to-end tests for `extscan filter`.
//!
//! These drive the command through argument parsing and the pipeline with
//! in-memory stdin/stdout/stderr and extension directories on disk.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p extscan-cli --test filter_cli
//! ```

use extscan_cli::cli_args::{parse_invocation, Invocation};
use extscan_cli::commands::filter::execute;
use extscan_core::{Drained, Filter};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A directory tree laid out like an extension store.
struct Store {
    tmp: TempDir,
}

impl Store {
    fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Writes `<root>/<id>/<hash>/manifest.json`, returning the extension root.
    fn add(&self, id: u32, manifest: &str) -> PathBuf {
        let root = self.tmp.path().join(id.to_string()).join(format!("{id:064x}"));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("manifest.json"), manifest).unwrap();
        root
    }

    /// Writes a manifest in the network-share layout.
    fn add_unzipped(&self, parts: [u32; 4], manifest: &str) -> PathBuf {
        let [a, b, c, d] = parts;
        let root = self
            .tmp
            .path()
            .join("unzipped")
            .join("1")
            .join(a.to_string())
            .join(b.to_string())
            .join(c.to_string())
            .join(d.to_string());
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("manifest.json"), manifest).unwrap();
        root
    }
}

fn line(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn filter_from(argv: &[&str]) -> Filter {
    match parse_invocation(argv.iter().copied()) {
        Invocation::Filter(kind) => kind.into_filter().expect("filter should build"),
        other => panic!("expected a filter invocation, got {other:?}"),
    }
}

async fn run(filter: Filter, input: &str) -> Drained<Vec<u8>, Vec<u8>> {
    execute(filter, input.as_bytes(), Vec::new(), Vec::new())
        .await
        .expect("pipeline should not lose its sinks")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_permissions_filter_keeps_matching_paths_in_order() {
    let store = Store::new();
    let tabs = store.add(1, r#"{"permissions": ["tabs", "webRequest"]}"#);
    let storage = store.add(2, r#"{"permissions": ["storage"]}"#);
    let blocking = store.add(
        3,
        r#"{"permissions": ["webRequest"], "optional_permissions": ["webRequestBlocking"]}"#,
    );
    let optional_tabs = store.add(4, r#"{"optional_permissions": ["tabs"]}"#);

    let input = [
        line(&tabs.join("background.js")),
        line(&storage),
        line(&blocking.join("manifest.json")),
        line(&optional_tabs),
    ]
    .join("\n");

    let filter = filter_from(&[
        "extscan",
        "filter",
        "permissions",
        "webRequest,webRequestBlocking",
        "tabs",
    ]);
    let drained = run(filter, &input).await;

    let expected = format!(
        "{}\n{}\n{}\n",
        line(&tabs.join("background.js")),
        line(&blocking.join("manifest.json")),
        line(&optional_tabs)
    );
    assert_eq!(text(&drained.out), expected);
    assert!(drained.err.is_empty());
    assert_eq!(drained.stats.dispatched, 4);
    assert!(drained.into_result().is_ok());
}

#[tokio::test]
async fn test_manifest_filter_via_program_name() {
    let store = Store::new();
    let v1 = store.add(10, r#"{"version": "1.2.3"}"#);
    let v2 = store.add(11, r#"{"version": "2.0"}"#);
    let commented = store.add(12, "\u{feff}{\"version\": \"1\" /* test */}");
    let share = store.add_unzipped([2019, 3, 17, 884], r#"{"version": "1.0.0"}"#);

    let input = format!(
        "{}\n{}\n{}\n{}\n",
        line(&v1),
        line(&v2),
        line(&commented),
        line(&share.join("icons").join("16.png"))
    );

    let filter = filter_from(&["/usr/local/bin/extscan-filter-manifest", "version", r"^1(\.|$)"]);
    let drained = run(filter, &input).await;

    let expected = format!(
        "{}\n{}\n{}\n",
        line(&v1),
        line(&commented),
        line(&share.join("icons").join("16.png"))
    );
    assert_eq!(text(&drained.out), expected);
    assert!(drained.err.is_empty());
}

#[tokio::test]
async fn test_unresolvable_and_broken_lines_warn_in_order() {
    let store = Store::new();
    let good = store.add(20, r#"{"permissions": ["tabs"]}"#);
    let broken = store.add(21, r#"{"permissions": ["tabs"]"#);
    let not_object = store.add(22, r#"["tabs"]"#);

    let input = format!(
        "/var/tmp/readme.txt\n{}\n{}\n{}\n",
        line(&broken),
        line(&good),
        line(&not_object)
    );

    let filter = filter_from(&["extscan", "filter", "permissions", "tabs"]);
    let drained = run(filter, &input).await;

    assert_eq!(text(&drained.out), format!("{}\n", line(&good)));

    let err = text(&drained.err);
    let warnings: Vec<&str> = err.lines().collect();
    assert_eq!(warnings.len(), 3, "{err}");
    assert_eq!(warnings[0], "/var/tmp/readme.txt: not an extension directory");
    assert!(warnings[1].starts_with(&format!("{}: failed to parse", line(&broken))));
    assert!(warnings[2].starts_with(&format!("{}: ", line(&not_object))));
    assert!(warnings[2].ends_with("is not a JSON object (found array)"));

    assert_eq!(drained.stats.warned, 3);
    assert!(drained.failure.is_none());
}

#[tokio::test]
async fn test_repeated_runs_agree() {
    let store = Store::new();
    let ext = store.add(30, r#"{"name": "Example", "manifest_version": 3}"#);
    let input = format!("{}\n", line(&ext));

    let mut outputs = Vec::new();
    for _ in 0..2 {
        let filter = filter_from(&["extscan", "filter", "manifest", "manifest_version", "^3$"]);
        outputs.push(text(&run(filter, &input).await.out));
    }
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0], format!("{}\n", line(&ext)));
}

#[test]
fn test_empty_key_path_fails_before_input() {
    match parse_invocation(["extscan", "filter", "manifest", "", "x"]) {
        Invocation::Filter(kind) => assert!(kind.into_filter().is_err()),
        other => panic!("expected a filter invocation, got {other:?}"),
    }
}

#[test]
fn test_invalid_pattern_fails_before_input() {
    match parse_invocation(["extscan", "filter", "manifest", "version", "[unclosed"]) {
        Invocation::Filter(kind) => {
            let err = kind.into_filter().unwrap_err();
            assert!(err.to_string().contains("[unclosed"));
        }
        other => panic!("expected a filter invocation, got {other:?}"),
    }
}
