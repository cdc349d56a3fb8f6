//! Store roots.
//!
//! A [`File`] is the handle to a store root: a directory whose metadata
//! record carries the "file" type. It is a group in every respect -- child
//! management comes from [`Group`] -- plus open/create semantics and the
//! per-open configuration (io mode, naming policy, plugin pipeline) that
//! every descendant handle inherits.

use std::fs;
use std::ops::Deref;
use std::path::Path;

use tracing::debug;

use crate::error::{ExdirError, Result};
use crate::group::Group;
use crate::meta::{self, ObjectType};
use crate::names::NamePolicy;
use crate::object::{IoMode, Object};
use crate::plugin::PluginRegistry;

/// How to open a store root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing store; all maps and sidecar accessors reject
    /// writes.
    ReadOnly,
    /// Open an existing store for reading and writing.
    ReadWrite,
    /// Open the store, creating the root directory if it is absent.
    #[default]
    OpenOrCreate,
    /// Create a new store; an existing directory is an error.
    CreateNew,
}

/// Per-open configuration, fixed for the lifetime of the handle.
#[derive(Clone, Debug, Default)]
pub struct OpenOptions {
    pub mode: OpenMode,
    pub name_policy: NamePolicy,
    /// Transform pipeline applied to every dataset under this root.
    /// Registration order is significant and must match between the
    /// writing and reading opens for round-trip correctness.
    pub plugins: PluginRegistry,
}

/// A handle to a store root.
#[derive(Clone, Debug)]
pub struct File {
    group: Group,
}

impl File {
    /// Open (or create) a store root with default options.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(directory, OpenOptions::default())
    }

    /// Open a store root with explicit options.
    pub fn open_with(directory: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let directory = directory.as_ref();
        let exists = directory.exists();

        match options.mode {
            OpenMode::CreateNew if exists => {
                return Err(ExdirError::AlreadyExists(directory.to_path_buf()));
            }
            OpenMode::ReadOnly | OpenMode::ReadWrite if !exists => {
                return Err(ExdirError::NotFound(directory.to_path_buf()));
            }
            _ => {}
        }

        if exists {
            match meta::read_type(directory) {
                Some(ObjectType::File) => {}
                Some(other) => {
                    return Err(ExdirError::TypeConflict {
                        path: directory.to_path_buf(),
                        reason: format!("expected an exdir file, found {other}"),
                    });
                }
                None => {
                    return Err(ExdirError::TypeConflict {
                        path: directory.to_path_buf(),
                        reason: "directory exists but is not an exdir file".into(),
                    });
                }
            }
        } else {
            meta::create_object_directory(directory, ObjectType::File)?;
        }

        let io_mode = match options.mode {
            OpenMode::ReadOnly => IoMode::ReadOnly,
            _ => IoMode::ReadWrite,
        };
        let root = fs::canonicalize(directory)?;
        debug!(root = %root.display(), ?io_mode, "opened store root");

        let object = Object::new(
            root,
            String::new(),
            String::new(),
            io_mode,
            options.name_policy,
            options.plugins,
        );
        Ok(File {
            group: Group::new(object),
        })
    }
}

impl Deref for File {
    type Target = Group;

    fn deref(&self) -> &Group {
        &self.group
    }
}
