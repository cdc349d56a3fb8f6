//! Path resolution: finding the store root above an arbitrary path.
//!
//! A store root is discovered by walking parents upward until a directory
//! classifies as a "file"-typed managed object; there is no registry or
//! index. The walk is deliberately permissive: missing or malformed
//! metadata anywhere along the chain just continues the climb, so a valid
//! dataset or group directory is walked past silently too.

use std::path::{Path, PathBuf};

use crate::error::{ExdirError, Result};
use crate::file::{File, OpenOptions};
use crate::group::Node;
use crate::meta::{self, ObjectType};

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Walk upward from `path` to the enclosing store root, if any.
pub fn find_root(path: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = absolutize(path.as_ref());
    loop {
        if meta::read_type(&current) == Some(ObjectType::File) {
            return Some(current);
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

/// Whether the path lies under some store root.
pub fn is_inside_store(path: impl AsRef<Path>) -> bool {
    find_root(path).is_some()
}

/// Resolve a path to its store root and the object name relative to it.
///
/// The relative name uses `/` as the separator regardless of the host
/// convention; `.` denotes the root object itself.
pub fn resolve(path: impl AsRef<Path>) -> Result<(PathBuf, String)> {
    let absolute = absolutize(path.as_ref());
    let root = find_root(&absolute).ok_or_else(|| ExdirError::NotInStore(absolute.clone()))?;
    let relative = absolute
        .strip_prefix(&root)
        .expect("discovered root is an ancestor of the path");
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if name.is_empty() {
        Ok((root, ".".to_string()))
    } else {
        Ok((root, name))
    }
}

/// Open the object at an absolute path without knowing its root in
/// advance, with default options.
pub fn open_object(path: impl AsRef<Path>) -> Result<Node> {
    open_object_with(path, OpenOptions::default())
}

/// Open the object at an absolute path, supplying per-open options (io
/// mode, naming policy, plugin pipeline).
pub fn open_object_with(path: impl AsRef<Path>, options: OpenOptions) -> Result<Node> {
    let (root, name) = resolve(path.as_ref())?;
    let file = File::open_with(&root, options)?;
    if name == "." {
        return Ok(Node::File(file));
    }
    file.get(&name)?
        .ok_or_else(|| ExdirError::NotFound(path.as_ref().to_path_buf()))
}
