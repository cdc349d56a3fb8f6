//! The shared filesystem object core.
//!
//! An [`Object`] is identified by `(root_directory, parent_path,
//! object_name)`; its on-disk directory is derived from that triple, never
//! stored. Handles are thin, recreatable views: opening the same object
//! twice yields two independent views over the same bytes, and a view sees
//! another's writes only by going back to disk.

use std::path::{Path, PathBuf};

use serde_yml::Mapping;
use tracing::debug;

use crate::attribute::Attribute;
use crate::error::{ExdirError, Result};
use crate::meta;
use crate::names::{self, NamePolicy};
use crate::plugin::PluginRegistry;
use crate::raw::Raw;

/// Whether a store handle may mutate the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoMode {
    ReadWrite,
    ReadOnly,
}

/// The core shared by files, groups, datasets, and raw handles.
#[derive(Clone, Debug)]
pub struct Object {
    root_directory: PathBuf,
    parent_path: String,
    object_name: String,
    io_mode: IoMode,
    name_policy: NamePolicy,
    plugins: PluginRegistry,
}

impl Object {
    pub(crate) fn new(
        root_directory: PathBuf,
        parent_path: String,
        object_name: String,
        io_mode: IoMode,
        name_policy: NamePolicy,
        plugins: PluginRegistry,
    ) -> Self {
        Self {
            root_directory,
            parent_path,
            object_name,
            io_mode,
            name_policy,
            plugins,
        }
    }

    /// The store root this object belongs to.
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// The object's own name (final path component).
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Path of the parent, relative to the root, `/`-separated.
    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    /// Path relative to the root, `/`-separated; empty for the root itself.
    pub fn relative_path(&self) -> String {
        if self.parent_path.is_empty() {
            self.object_name.clone()
        } else {
            format!("{}/{}", self.parent_path, self.object_name)
        }
    }

    /// Canonical object name, `/`-rooted.
    pub fn name(&self) -> String {
        format!("/{}", self.relative_path())
    }

    /// How the store was opened.
    pub fn io_mode(&self) -> IoMode {
        self.io_mode
    }

    /// The absolute on-disk directory, derived from the identity triple.
    pub fn directory(&self) -> PathBuf {
        let mut directory = self.root_directory.clone();
        for component in self.relative_path().split('/').filter(|c| !c.is_empty()) {
            directory.push(component);
        }
        directory
    }

    /// Live accessor over this object's user attributes.
    pub fn attrs(&self) -> Attribute {
        Attribute::new(meta::attributes_filename(&self.directory()), self.io_mode)
    }

    /// Overwrite the user attributes wholesale.
    pub fn set_attrs(&self, mapping: Mapping) -> Result<()> {
        self.attrs().replace(mapping)
    }

    /// Live accessor over this object's metadata sidecar.
    pub fn meta(&self) -> Attribute {
        Attribute::new(meta::meta_filename(&self.directory()), self.io_mode)
    }

    /// Create a plain, unmanaged subdirectory.
    ///
    /// The directory gets no metadata record, which is exactly what makes
    /// it raw.
    pub fn create_raw(&self, name: &str) -> Result<Raw> {
        self.ensure_writable()?;
        names::validate(self.name_policy, &self.directory(), name)?;
        let directory = self.directory().join(name);
        if directory.exists() {
            return Err(ExdirError::AlreadyExists(directory));
        }
        std::fs::create_dir(&directory)?;
        debug!(directory = %directory.display(), "created raw directory");
        Ok(Raw::new(self.child(name)))
    }

    /// Idempotent raw-directory access.
    ///
    /// An existing managed object under this name is a conflict; an
    /// existing raw directory is returned as-is.
    pub fn require_raw(&self, name: &str) -> Result<Raw> {
        let directory = self.directory().join(name);
        if directory.exists() {
            if meta::is_managed_object(&directory) {
                return Err(ExdirError::TypeConflict {
                    path: directory,
                    reason: "already exists, but is not raw".into(),
                });
            }
            return Ok(Raw::new(self.child(name)));
        }
        self.create_raw(name)
    }

    pub(crate) fn child(&self, name: &str) -> Object {
        Object::new(
            self.root_directory.clone(),
            self.relative_path(),
            name.to_string(),
            self.io_mode,
            self.name_policy,
            self.plugins.clone(),
        )
    }

    pub(crate) fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub(crate) fn name_policy(&self) -> NamePolicy {
        self.name_policy
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.io_mode == IoMode::ReadOnly {
            return Err(ExdirError::ReadOnly);
        }
        Ok(())
    }
}
