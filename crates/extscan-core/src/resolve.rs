//! Extension directory resolution.
//!
//! Input lines are arbitrary paths somewhere inside an unpacked extension.
//! Two on-disk layouts are recognised, and the resolver returns the prefix of
//! the path that names the extension root:
//!
//! 1. `<prefix>/<id digits>/<64 lowercase hex>`: extensions stored by numeric
//!    id and content hash.
//! 2. `<prefix>/unzipped/1/<digits>/<digit>/<digits>/<digits>`: extensions
//!    extracted onto the network share.
//!
//! Both patterns start at a path-segment boundary and must end at a separator
//! or at the end of the path. The hash layout is tried first; a path matching
//! both resolves to the hash-layout root.

use regex::Regex;
use std::sync::OnceLock;

const HASH_LAYOUT_PATTERN: &str = r"^(.*?(?:^|[/\\])[0-9]+[/\\][0-9a-f]{64})(?:[/\\]|$)";

const SHARE_LAYOUT_PATTERN: &str =
    r"^(.*?(?:^|[/\\])unzipped[/\\]1[/\\][0-9]+[/\\][0-9][/\\][0-9]+[/\\][0-9]+)(?:[/\\]|$)";

static LAYOUT_REGEXES: OnceLock<[Regex; 2]> = OnceLock::new();

fn layout_regexes() -> &'static [Regex; 2] {
    LAYOUT_REGEXES.get_or_init(|| {
        [
            Regex::new(HASH_LAYOUT_PATTERN).expect("invalid regex pattern"),
            Regex::new(SHARE_LAYOUT_PATTERN).expect("invalid regex pattern"),
        ]
    })
}

/// Returns the extension root directory contained in `path`, if any.
///
/// The returned slice borrows from `path` and never ends with a separator.
pub fn extension_dir(path: &str) -> Option<&str> {
    layout_regexes().iter().find_map(|re| {
        re.captures(path)
            .and_then(|caps| caps.get(1))
            .map(|root| &path[..root.end()])
    })
}
