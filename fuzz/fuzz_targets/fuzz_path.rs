// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for lexical path helpers

#![no_main]

use fsrch_core::path::{clean, extension, rel_path_string};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let cleaned = clean(Path::new(input));
        assert_eq!(clean(&cleaned), cleaned);
        assert!(!cleaned.as_os_str().is_empty());

        let ext = extension(input);
        assert!(ext.is_empty() || ext.starts_with('.'));
        assert!(input.ends_with(ext));
        assert!(!ext.contains('/'));

        let rel = rel_path_string(Path::new(input));
        assert!(!rel.is_empty());
    }
});
