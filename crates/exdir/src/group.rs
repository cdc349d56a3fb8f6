//! Groups: typed containers of other objects.

use std::fs;
use std::ops::Deref;

use exdir_npy::Value;

use crate::dataset::Dataset;
use crate::error::{ExdirError, Result};
use crate::file::File;
use crate::meta::{self, ObjectType};
use crate::names;
use crate::object::Object;
use crate::raw::Raw;

/// A typed container object. Children are one directory level down;
/// nothing is tracked in memory, so membership queries always reflect the
/// directory's current contents.
#[derive(Clone, Debug)]
pub struct Group {
    object: Object,
}

/// A child resolved from disk, classified by its metadata record.
#[derive(Clone, Debug)]
pub enum Node {
    File(File),
    Group(Group),
    Dataset(Dataset),
    Raw(Raw),
}

impl Node {
    pub fn into_group(self) -> Option<Group> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }

    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            Self::Dataset(dataset) => Some(dataset),
            _ => None,
        }
    }

    pub fn into_raw(self) -> Option<Raw> {
        match self {
            Self::Raw(raw) => Some(raw),
            _ => None,
        }
    }
}

impl Group {
    pub(crate) fn new(object: Object) -> Self {
        Self { object }
    }

    /// Create a child group.
    pub fn create_group(&self, name: &str) -> Result<Group> {
        self.object.ensure_writable()?;
        names::validate(self.object.name_policy(), &self.directory(), name)?;
        meta::create_object_directory(&self.directory().join(name), ObjectType::Group)?;
        Ok(Group::new(self.object.child(name)))
    }

    /// Open the named child group, creating it if absent.
    ///
    /// An existing child of any other kind is a conflict.
    pub fn require_group(&self, name: &str) -> Result<Group> {
        let directory = self.directory().join(name);
        match meta::read_type(&directory) {
            Some(ObjectType::Group) => Ok(Group::new(self.object.child(name))),
            Some(other) => Err(ExdirError::TypeConflict {
                path: directory,
                reason: format!("expected a group, found {other}"),
            }),
            None if directory.is_dir() => Err(ExdirError::TypeConflict {
                path: directory,
                reason: "expected a group, found a raw directory".into(),
            }),
            None => self.create_group(name),
        }
    }

    /// Create a child dataset and write its initial payload through the
    /// plugin pipeline.
    pub fn create_dataset(&self, name: &str, value: impl Into<Value>) -> Result<Dataset> {
        self.object.ensure_writable()?;
        names::validate(self.object.name_policy(), &self.directory(), name)?;
        meta::create_object_directory(&self.directory().join(name), ObjectType::Dataset)?;
        let mut dataset = Dataset::new(self.object.child(name));
        dataset.reset_data(value.into())?;
        Ok(dataset)
    }

    /// Open the named child dataset, creating it with `value` if absent.
    ///
    /// An existing dataset is returned with its on-disk contents
    /// untouched; an existing child of any other kind is a conflict.
    pub fn require_dataset(&self, name: &str, value: impl Into<Value>) -> Result<Dataset> {
        let directory = self.directory().join(name);
        match meta::read_type(&directory) {
            Some(ObjectType::Dataset) => Ok(Dataset::new(self.object.child(name))),
            Some(other) => Err(ExdirError::TypeConflict {
                path: directory,
                reason: format!("expected a dataset, found {other}"),
            }),
            None if directory.is_dir() => Err(ExdirError::TypeConflict {
                path: directory,
                reason: "expected a dataset, found a raw directory".into(),
            }),
            None => self.create_dataset(name, value),
        }
    }

    /// Look up a child (or a `/`-separated descendant). Returns `None`
    /// when any component is missing; intermediate components must be
    /// groups.
    pub fn get(&self, name: &str) -> Result<Option<Node>> {
        let components: Vec<&str> = name
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();

        let mut current = self.clone();
        let mut components = components.into_iter().peekable();
        while let Some(component) = components.next() {
            let directory = current.directory().join(component);
            let node = match meta::read_type(&directory) {
                Some(ObjectType::Group) => Node::Group(Group::new(current.object.child(component))),
                Some(ObjectType::Dataset) => {
                    Node::Dataset(Dataset::new(current.object.child(component)))
                }
                Some(ObjectType::File) => {
                    return Err(ExdirError::TypeConflict {
                        path: directory,
                        reason: "nested 'file' object".into(),
                    })
                }
                None if directory.is_dir() => Node::Raw(Raw::new(current.object.child(component))),
                None => return Ok(None),
            };
            if components.peek().is_none() {
                return Ok(Some(node));
            }
            current = match node {
                Node::Group(group) => group,
                _ => return Ok(None),
            };
        }
        Ok(None)
    }

    /// Whether a child (or descendant) with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        matches!(self.get(name), Ok(Some(_)))
    }

    /// Sorted names of the managed children (groups and datasets). Raw
    /// directories are not listed.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(self.directory())? {
            let entry = entry?;
            if entry.file_type()?.is_dir() && meta::is_managed_object(&entry.path()) {
                keys.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl Deref for Group {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &std::path::Path) -> File {
        File::open(dir.join("store.exdir")).unwrap()
    }

    #[test]
    fn create_group_and_classify() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        let group = file.create_group("session").unwrap();
        assert_eq!(group.name(), "/session");
        assert_eq!(meta::read_type(&group.directory()), Some(ObjectType::Group));
    }

    #[test]
    fn create_group_rejects_duplicates_and_bad_names() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        file.create_group("session").unwrap();
        assert!(matches!(
            file.create_group("session").unwrap_err(),
            ExdirError::AlreadyExists(_)
        ));
        assert!(matches!(
            file.create_group("bad/name").unwrap_err(),
            ExdirError::InvalidName { .. }
        ));
    }

    #[test]
    fn require_group_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        let first = file.require_group("session").unwrap();
        let second = file.require_group("session").unwrap();
        assert_eq!(first.directory(), second.directory());
    }

    #[test]
    fn require_group_conflicts_with_other_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        file.create_dataset("ds", vec![1i64]).unwrap();
        file.create_raw("blob").unwrap();
        assert!(matches!(
            file.require_group("ds").unwrap_err(),
            ExdirError::TypeConflict { .. }
        ));
        assert!(matches!(
            file.require_group("blob").unwrap_err(),
            ExdirError::TypeConflict { .. }
        ));
    }

    #[test]
    fn require_dataset_returns_existing_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        file.create_dataset("ds", vec![1i64, 2]).unwrap();
        let mut again = file.require_dataset("ds", vec![9i64]).unwrap();
        assert_eq!(
            again.read().unwrap(),
            exdir_npy::Value::from(vec![1i64, 2])
        );
    }

    #[test]
    fn get_classifies_children() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        file.create_group("g").unwrap();
        file.create_dataset("d", vec![1i64]).unwrap();
        file.create_raw("r").unwrap();

        assert!(matches!(file.get("g").unwrap(), Some(Node::Group(_))));
        assert!(matches!(file.get("d").unwrap(), Some(Node::Dataset(_))));
        assert!(matches!(file.get("r").unwrap(), Some(Node::Raw(_))));
        assert!(file.get("missing").unwrap().is_none());
    }

    #[test]
    fn get_descends_nested_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        let outer = file.create_group("outer").unwrap();
        let inner = outer.create_group("inner").unwrap();
        inner.create_dataset("leaf", vec![1i64]).unwrap();

        let node = file.get("outer/inner/leaf").unwrap().unwrap();
        let ds = node.into_dataset().unwrap();
        assert_eq!(ds.name(), "/outer/inner/leaf");

        // A dataset cannot be an intermediate component.
        assert!(file.get("outer/inner/leaf/deeper").unwrap().is_none());
    }

    #[test]
    fn keys_list_managed_children_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        file.create_group("zebra").unwrap();
        file.create_dataset("alpha", vec![1i64]).unwrap();
        file.create_raw("blob").unwrap();

        assert_eq!(file.keys().unwrap(), vec!["alpha", "zebra"]);
        assert!(file.contains("zebra"));
        assert!(!file.contains("blob/deeper"));
    }

    #[test]
    fn malformed_child_metadata_classifies_as_raw() {
        let tmp = tempfile::tempdir().unwrap();
        let file = store(tmp.path());
        let group = file.create_group("g").unwrap();
        std::fs::write(meta::meta_filename(&group.directory()), "exdir: [broken").unwrap();

        assert!(matches!(file.get("g").unwrap(), Some(Node::Raw(_))));
        assert_eq!(file.keys().unwrap(), Vec::<String>::new());
    }
}
