//! Sidecar metadata records.
//!
//! Every managed object directory carries an `exdir.yaml` sidecar tagging it
//! with a type from the closed set {dataset, group, file} and a schema
//! version. Raw-ness is derived, never stored: a directory without a valid
//! record simply classifies as unmanaged. The classification is computed
//! fresh on every query so independent handles agree through the filesystem
//! alone.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ExdirError, Result};

/// Filename of the per-object metadata sidecar.
pub const META_FILENAME: &str = "exdir.yaml";

/// Filename of the per-object attribute sidecar.
pub const ATTRIBUTES_FILENAME: &str = "attributes.yaml";

/// Schema version written into new metadata records.
pub const META_VERSION: u64 = 1;

/// The closed set of managed object types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Dataset,
    Group,
    File,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset => write!(f, "dataset"),
            Self::Group => write!(f, "group"),
            Self::File => write!(f, "file"),
        }
    }
}

impl FromStr for ObjectType {
    type Err = ExdirError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dataset" => Ok(Self::Dataset),
            "group" => Ok(Self::Group),
            "file" => Ok(Self::File),
            other => Err(ExdirError::InvalidType(other.to_string())),
        }
    }
}

/// The full `exdir.yaml` record: `{exdir: {type, version}}`.
///
/// Unknown extra keys (the dataset layer's `plugins` table lives in the
/// same file) are ignored when classifying.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct MetaRecord {
    pub exdir: MetaBody,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct MetaBody {
    #[serde(rename = "type")]
    pub object_type: ObjectType,
    pub version: u64,
}

impl MetaRecord {
    pub(crate) fn new(object_type: ObjectType) -> Self {
        Self {
            exdir: MetaBody {
                object_type,
                version: META_VERSION,
            },
        }
    }
}

/// Path of a directory's metadata sidecar.
pub fn meta_filename(directory: &Path) -> PathBuf {
    directory.join(META_FILENAME)
}

/// Path of a directory's attribute sidecar.
pub fn attributes_filename(directory: &Path) -> PathBuf {
    directory.join(ATTRIBUTES_FILENAME)
}

/// Create an object directory together with its metadata record.
///
/// The directory is made first, then the record is written; a crash in
/// between leaves a raw directory, never a half-typed one.
pub fn create_object_directory(directory: &Path, object_type: ObjectType) -> Result<()> {
    if directory.exists() {
        return Err(ExdirError::AlreadyExists(directory.to_path_buf()));
    }
    fs::create_dir(directory)?;
    let record = MetaRecord::new(object_type);
    fs::write(meta_filename(directory), serde_yml::to_string(&record)?)?;
    debug!(directory = %directory.display(), %object_type, "created object directory");
    Ok(())
}

/// Classify a directory: `Some(type)` for a managed object, `None` for
/// anything else.
///
/// Missing files, malformed records, missing keys, and unknown type names
/// all yield `None` -- "raw" is the safe fallback classification and this
/// function never errors.
pub fn read_type(directory: &Path) -> Option<ObjectType> {
    let path = meta_filename(directory);
    let contents = fs::read_to_string(&path).ok()?;
    match serde_yml::from_str::<MetaRecord>(&contents) {
        Ok(record) => Some(record.exdir.object_type),
        Err(error) => {
            warn!(path = %path.display(), %error, "malformed metadata record; treating directory as raw");
            None
        }
    }
}

/// Whether the directory is a managed object (valid record, known type).
pub fn is_managed_object(directory: &Path) -> bool {
    read_type(directory).is_some()
}

/// Whether the directory exists but is not a managed object.
pub fn is_unmanaged_directory(directory: &Path) -> bool {
    directory.is_dir() && read_type(directory).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_classify_every_type() {
        let dir = tempfile::tempdir().unwrap();
        for object_type in [ObjectType::Dataset, ObjectType::Group, ObjectType::File] {
            let target = dir.path().join(object_type.to_string());
            create_object_directory(&target, object_type).unwrap();
            assert!(is_managed_object(&target));
            assert!(!is_unmanaged_directory(&target));
            assert_eq!(read_type(&target), Some(object_type));
        }
    }

    #[test]
    fn create_rejects_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a");
        create_object_directory(&target, ObjectType::Group).unwrap();
        let err = create_object_directory(&target, ObjectType::Group).unwrap_err();
        assert!(matches!(err, ExdirError::AlreadyExists(_)));
    }

    #[test]
    fn plain_directory_is_unmanaged() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("plain");
        fs::create_dir(&target).unwrap();
        assert!(!is_managed_object(&target));
        assert!(is_unmanaged_directory(&target));
    }

    #[test]
    fn missing_directory_is_neither() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing");
        assert!(!is_managed_object(&target));
        assert!(!is_unmanaged_directory(&target));
    }

    #[test]
    fn malformed_record_degrades_to_raw() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("broken");
        fs::create_dir(&target).unwrap();

        for contents in [
            "not: a: valid: yaml: [",
            "just a string",
            "exdir: {version: 1}",
            "exdir: {type: teapot, version: 1}",
            "",
        ] {
            fs::write(meta_filename(&target), contents).unwrap();
            assert!(!is_managed_object(&target), "contents {contents:?}");
            assert!(is_unmanaged_directory(&target));
        }
    }

    #[test]
    fn extra_keys_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("ds");
        create_object_directory(&target, ObjectType::Dataset).unwrap();
        let mut contents = fs::read_to_string(meta_filename(&target)).unwrap();
        contents.push_str("plugins: {}\n");
        fs::write(meta_filename(&target), contents).unwrap();
        assert_eq!(read_type(&target), Some(ObjectType::Dataset));
    }

    #[test]
    fn type_name_parsing() {
        assert_eq!("group".parse::<ObjectType>().unwrap(), ObjectType::Group);
        assert!(matches!(
            "table".parse::<ObjectType>(),
            Err(ExdirError::InvalidType(_))
        ));
    }
}
