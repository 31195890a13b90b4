//! Virtual directories derived from flat object names.
//!
//! A directory never exists in the bucket itself; it is implied by `/`
//! separators in object names and materialised lazily by the ancestor
//! walk. Root is `"/"` and is its own parent.

use serde::Serialize;
use sqlx::FromRow;

/// One row per virtual directory that has ever held a descendant object.
///
/// The per-tier sizes and `count` roll up over descendants at all depths,
/// not just direct children. Rows are never deleted; a directory whose
/// totals have returned to zero is simply hidden from listings.
#[derive(Serialize, Clone, FromRow, Debug)]
pub struct DirectoryRecord {
    pub bucket: String,

    /// Directory path, always ending in `/`.
    pub name: String,

    /// Number of descendant objects at all depths.
    pub count: i64,

    pub size_standard: i64,
    pub size_nearline: i64,
    pub size_coldline: i64,
    pub size_archive: i64,

    /// Immediate parent directory; root's parent is root.
    pub parent: String,
}

/// Returns the immediate virtual directory of `name`.
///
/// Exactly one trailing `/` is stripped before searching for the
/// separator, so `"a/b/"` and `"a/b"` share the parent `"a/"`.
/// Consecutive slashes are significant: `parent("a//b") == "a//"`.
pub fn parent(name: &str) -> String {
    let trimmed = name.strip_suffix('/').unwrap_or(name);

    // Handle root
    if trimmed.is_empty() {
        return "/".to_string();
    }

    match trimmed.rfind('/') {
        None => "/".to_string(), // file in root directory
        Some(last) => trimmed[..=last].to_string(),
    }
}

/// Returns the chain of directories from `parent(name)` up to and
/// including root. Root's own ancestor list is `["/"]`.
pub fn ancestors(name: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = parent(name);
    loop {
        let at_root = current == "/";
        chain.push(current.clone());
        if at_root {
            break;
        }
        current = parent(&current);
    }
    chain
}
