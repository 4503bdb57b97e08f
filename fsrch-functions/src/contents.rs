// SPDX-License-Identifier: AGPL-3.0-or-later
//! File contents function

use bytes::Bytes;
use fsrch_core::{EvalContext, Value};
use tracing::debug;

/// `contents(path)`: the whole file as bytes, absent on any I/O error.
/// Relative paths resolve against the scan root.
///
/// Reads synchronously and without a size limit.
pub fn contents(ctx: &EvalContext, args: &[Value]) -> Option<Value> {
    let path = ctx.resolve(&args.first()?.to_text());
    match std::fs::read(&path) {
        Ok(data) => Some(Value::Bytes(Bytes::from(data))),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "contents: read failed");
            None
        }
    }
}
