// SPDX-License-Identifier: AGPL-3.0-or-later
//! Built-in scalar functions
//!
//! Each function reports failure as an absent value rather than an error,
//! so a bad input blanks one cell instead of aborting the scan.

mod contents;
mod path;

pub use contents::contents;
pub use path::{abs, ext};

use fsrch_core::ScalarFunction;
use fsrch_source::Registry;

/// All built-in functions
pub const BUILTINS: [ScalarFunction; 3] = [
    ScalarFunction::new("abs", 1, "Absolute path of the argument", abs),
    ScalarFunction::new("ext", 1, "File extension of the argument, including the dot", ext),
    ScalarFunction::new("contents", 1, "Contents of the file at the given path", contents),
];

/// Registers every built-in function
pub fn register_builtins(registry: &mut Registry) {
    for function in BUILTINS {
        registry.register_function(function);
    }
}
