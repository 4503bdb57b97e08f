// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scalar function descriptors

use crate::{error::FsrchError, FsrchResult, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Function body. `None` means "no value", which callers render as an
/// absent cell instead of failing the scan.
pub type ScalarFn = fn(&EvalContext, &[Value]) -> Option<Value>;

/// Per-query state handed to every function call
///
/// Path arguments taken from `relPath` are relative to the scan root, so
/// relative paths resolve against `base` rather than the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalContext {
    base: PathBuf,
}

impl EvalContext {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Joins a relative `path` onto the base. Absolute paths are returned
    /// unchanged. The result is relative when the base is.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(".")
    }
}

/// A named scalar function
#[derive(Clone, Copy)]
pub struct ScalarFunction {
    pub name: &'static str,
    pub arity: usize,
    pub description: &'static str,
    pub func: ScalarFn,
}

impl ScalarFunction {
    pub const fn new(name: &'static str, arity: usize, description: &'static str, func: ScalarFn) -> Self {
        Self { name, arity, description, func }
    }

    pub fn call(&self, ctx: &EvalContext, args: &[Value]) -> FsrchResult<Option<Value>> {
        if args.len() != self.arity {
            return Err(FsrchError::ArityMismatch {
                function: self.name.to_string(),
                expected: self.arity,
                got: args.len(),
            });
        }
        Ok((self.func)(ctx, args))
    }
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}
