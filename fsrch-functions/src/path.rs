// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path functions

use fsrch_core::{path, EvalContext, Value};
use tracing::debug;

/// `abs(path)`: absolute, lexically cleaned form of the path. Relative
/// paths resolve against the scan root. Absent for empty input or when the
/// working directory is needed and cannot be determined.
pub fn abs(ctx: &EvalContext, args: &[Value]) -> Option<Value> {
    let text = args.first()?.to_text();
    if text.is_empty() {
        return None;
    }

    let resolved = ctx.resolve(&text);
    let full = if resolved.is_absolute() {
        resolved
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(resolved),
            Err(e) => {
                debug!(path = %text, error = %e, "abs: cannot read working directory");
                return None;
            }
        }
    };

    Some(Value::Text(path::clean(&full).to_string_lossy().into_owned()))
}

/// `ext(path)`: extension including the leading dot, or an empty string.
pub fn ext(_: &EvalContext, args: &[Value]) -> Option<Value> {
    let text = args.first()?.to_text();
    Some(Value::Text(path::extension(&text).to_string()))
}
