//! Object name validation.
//!
//! Valid object names:
//! - Must be non-empty and not `.` or `..`
//! - Must not contain a path separator (`/` or `\`)
//! - Must not equal a reserved sidecar filename, in any letter case
//! - Under `Strict`: ASCII alphanumerics, `-`, `_` only, at most 255 bytes
//! - Under `Thorough` (the default): additionally no control characters,
//!   and no case-insensitive collision with an existing sibling (two names
//!   that differ only in case are one directory on case-insensitive
//!   filesystems)

use std::fs;
use std::path::Path;

use crate::dataset::DATA_FILENAME;
use crate::error::{ExdirError, Result};
use crate::meta::{ATTRIBUTES_FILENAME, META_FILENAME};

/// Filenames an object name may never shadow.
const RESERVED_FILENAMES: &[&str] = &[META_FILENAME, ATTRIBUTES_FILENAME, DATA_FILENAME];

/// Maximum name length under the strict policy.
const STRICT_MAX_LEN: usize = 255;

/// Naming rule applied when objects are created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NamePolicy {
    /// ASCII alphanumerics, `-`, `_` only; length-bounded.
    Strict,
    /// Unicode-tolerant, but separator-, reserved-name-, and
    /// case-collision-safe.
    #[default]
    Thorough,
    /// No validation. The caller takes on collision and traversal risk.
    None,
}

/// Validate a candidate object name against a policy.
///
/// `parent_directory` is the directory the name would be created in; the
/// thorough policy scans it for case-insensitive sibling collisions.
pub fn validate(policy: NamePolicy, parent_directory: &Path, name: &str) -> Result<()> {
    match policy {
        NamePolicy::None => Ok(()),
        NamePolicy::Strict => validate_strict(name),
        NamePolicy::Thorough => validate_thorough(parent_directory, name),
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> ExdirError {
    ExdirError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn validate_common(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid(name, "name must not be '.' or '..'"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid(name, "name must not contain a path separator"));
    }
    let lowered = name.to_lowercase();
    if RESERVED_FILENAMES.iter().any(|r| *r == lowered) {
        return Err(invalid(name, "name is a reserved filename"));
    }
    Ok(())
}

fn validate_strict(name: &str) -> Result<()> {
    validate_common(name)?;
    if name.len() > STRICT_MAX_LEN {
        return Err(invalid(name, "name is too long"));
    }
    for ch in name.chars() {
        if !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
            return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
        }
    }
    Ok(())
}

fn validate_thorough(parent_directory: &Path, name: &str) -> Result<()> {
    validate_common(name)?;
    for ch in name.chars() {
        if ch.is_control() {
            return Err(invalid(name, format!("contains control character: {ch:?}")));
        }
    }

    // An exact-name collision is reported as AlreadyExists by the creation
    // path; this check only catches names that would alias an existing
    // sibling on a case-insensitive filesystem.
    if parent_directory.is_dir() {
        let lowered = name.to_lowercase();
        for entry in fs::read_dir(parent_directory)? {
            let existing = entry?.file_name().to_string_lossy().into_owned();
            if existing != name && existing.to_lowercase() == lowered {
                return Err(invalid(
                    name,
                    format!("case-insensitively collides with existing sibling {existing:?}"),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thorough(dir: &Path, name: &str) -> Result<()> {
        validate(NamePolicy::Thorough, dir, name)
    }

    #[test]
    fn valid_simple_names() {
        let dir = tempfile::tempdir().unwrap();
        assert!(thorough(dir.path(), "measurements").is_ok());
        assert!(thorough(dir.path(), "trial-07_b").is_ok());
        assert!(thorough(dir.path(), "température").is_ok());
    }

    #[test]
    fn reject_empty_and_dots() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", ".", ".."] {
            assert!(thorough(dir.path(), name).is_err(), "name {name:?}");
        }
    }

    #[test]
    fn reject_path_separators() {
        let dir = tempfile::tempdir().unwrap();
        assert!(thorough(dir.path(), "a/b").is_err());
        assert!(thorough(dir.path(), "a\\b").is_err());
    }

    #[test]
    fn reject_reserved_filenames() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["exdir.yaml", "attributes.yaml", "data.npy", "EXDIR.YAML"] {
            assert!(thorough(dir.path(), name).is_err(), "name {name:?}");
        }
    }

    #[test]
    fn reject_control_characters() {
        let dir = tempfile::tempdir().unwrap();
        assert!(thorough(dir.path(), "a\nb").is_err());
        assert!(thorough(dir.path(), "a\0b").is_err());
    }

    #[test]
    fn reject_case_collision_with_sibling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Data")).unwrap();
        assert!(thorough(dir.path(), "data").is_err());
        // The exact name is left for the creation path to report.
        assert!(thorough(dir.path(), "Data").is_ok());
        assert!(thorough(dir.path(), "other").is_ok());
    }

    #[test]
    fn strict_rejects_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate(NamePolicy::Strict, dir.path(), "plain_name-1").is_ok());
        assert!(validate(NamePolicy::Strict, dir.path(), "température").is_err());
        assert!(validate(NamePolicy::Strict, dir.path(), "has space").is_err());
        assert!(validate(NamePolicy::Strict, dir.path(), &"x".repeat(256)).is_err());
    }

    #[test]
    fn none_accepts_anything() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate(NamePolicy::None, dir.path(), "any/../thing").is_ok());
        assert!(validate(NamePolicy::None, dir.path(), "").is_ok());
    }
}
