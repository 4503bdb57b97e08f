// SPDX-License-Identifier: AGPL-3.0-or-later
//! Path text helpers

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Renders a file name as text. Bytes that are not valid UTF-8 become
/// `\xNN` escapes instead of U+FFFD, so two non-UTF-8 names never render
/// alike. An escaped name can still match a UTF-8 name that spells the
/// same escape literally.
pub fn name_string(name: &OsStr) -> Cow<'_, str> {
    if let Some(text) = name.to_str() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(escape_invalid(name))
}

#[cfg(unix)]
fn escape_invalid(name: &OsStr) -> String {
    use std::fmt::Write;
    use std::os::unix::ffi::OsStrExt;

    let mut out = String::new();
    let mut rest = name.as_bytes();
    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let bad = e.error_len().unwrap_or(after.len());
                for byte in &after[..bad] {
                    let _ = write!(out, "\\x{byte:02x}");
                }
                rest = &after[bad..];
            }
        }
    }
    out
}

#[cfg(not(unix))]
fn escape_invalid(name: &OsStr) -> String {
    name.to_string_lossy().into_owned()
}

/// Renders a root-relative path with `/` separators. The root itself is `.`.
pub fn rel_path_string(relative: &Path) -> String {
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(name_string(s)),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

/// Lexically normalizes a path: drops `.` segments and resolves `..`
/// against preceding segments without touching the filesystem.
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Suffix starting at the final `.` of the last path element, or `""`.
pub fn extension(path: &str) -> &str {
    for (i, c) in path.char_indices().rev() {
        if c == '/' || std::path::is_separator(c) {
            break;
        }
        if c == '.' {
            return &path[i..];
        }
    }
    ""
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rel_path_string() {
        assert_eq!(rel_path_string(Path::new("")), ".");
        assert_eq!(rel_path_string(Path::new("a.txt")), "a.txt");
        assert_eq!(rel_path_string(Path::new("sub/a.txt")), "sub/a.txt");
    }

    #[test]
    fn test_name_string_utf8_is_borrowed() {
        assert!(matches!(name_string(OsStr::new("a.txt")), Cow::Borrowed("a.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_name_string_escapes_invalid_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let ff = name_string(OsStr::from_bytes(b"x\xffy"));
        let fe = name_string(OsStr::from_bytes(b"x\xfey"));
        assert_eq!(ff, "x\\xffy");
        assert_eq!(fe, "x\\xfey");
        assert_ne!(ff, fe);

        // Valid multi-byte text around the bad byte survives intact.
        assert_eq!(name_string(OsStr::from_bytes(b"\xc3\xa9\x80")), "\u{e9}\\x80");
        assert_eq!(
            rel_path_string(Path::new(OsStr::from_bytes(b"sub/\xff"))),
            "sub/\\xff"
        );
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(Path::new("/home/user/./docs")), PathBuf::from("/home/user/docs"));
        assert_eq!(clean(Path::new("/home/user/../pictures")), PathBuf::from("/home/pictures"));
        assert_eq!(clean(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(clean(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(clean(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(clean(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("file.txt"), ".txt");
        assert_eq!(extension("sub/archive.tar.gz"), ".gz");
        assert_eq!(extension("sub.d/Makefile"), "");
        assert_eq!(extension(".bashrc"), ".bashrc");
        assert_eq!(extension("trailing."), ".");
        assert_eq!(extension(""), "");
    }
}
