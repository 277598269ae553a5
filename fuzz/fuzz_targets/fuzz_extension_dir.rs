#![no_main]

use extscan_core::resolve::extension_dir;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|path: &str| {
    if let Some(root) = extension_dir(path) {
        assert!(path.starts_with(root));
        assert!(!root.ends_with('/') && !root.ends_with('\\'));
    }
});
