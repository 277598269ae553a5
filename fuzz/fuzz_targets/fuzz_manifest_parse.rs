#![no_main]

use extscan_core::manifest::{parse, strip_comments};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse(text, Path::new("fuzz/manifest.json"));

        // Blanking comments never changes the line structure.
        let stripped = strip_comments(text);
        assert_eq!(stripped.lines().count(), text.lines().count());
    }
});
