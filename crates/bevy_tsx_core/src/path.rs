//! Helpers for the relative image paths stored in tileset files

use std::path::{Component, Path, PathBuf};

/// Check that `path` is a relative path the way Tiled writes them.
///
/// Returns the reason on failure.
pub fn check_relative_path(path: &str) -> Result<(), &'static str> {
    if path.trim().is_empty() {
        return Err("path is empty");
    }
    if path.contains('\0') {
        return Err("path contains a NUL byte");
    }
    if path.contains('\\') {
        return Err("path uses backslash separators");
    }
    if path.starts_with('/') || Path::new(path).has_root() {
        return Err("path is absolute");
    }
    // Windows drive prefix, e.g. "C:foo"
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err("path has a drive prefix");
    }
    if path.contains("://") {
        return Err("path is a URL");
    }
    Ok(())
}

/// Join `relative` onto `base` and collapse `.` and `..` without touching
/// the filesystem.
///
/// `..` components that would climb above the start of a relative `base`
/// are kept, so `resolve_relative("", "../a.png")` is `../a.png`.
pub fn resolve_relative(base: &Path, relative: &str) -> PathBuf {
    normalize(&base.join(relative))
}

/// Lexically normalize a path
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // ".." at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Convert a path to the forward-slash form used by asset servers
pub fn to_asset_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
