//! Live accessors over the YAML sidecar files.
//!
//! An [`Attribute`] is a thin view bound to one sidecar file. Every
//! operation reads the file fresh and writes it back whole, so independent
//! handles over the same object observe each other's writes by going back
//! to disk -- there is no in-memory cache to invalidate. A missing or empty
//! file reads as the empty mapping.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yml::{Mapping, Value};

use crate::error::{ExdirError, Result};
use crate::object::IoMode;

/// A live key/value view over one YAML sidecar file.
#[derive(Clone, Debug)]
pub struct Attribute {
    filename: PathBuf,
    io_mode: IoMode,
}

impl Attribute {
    pub(crate) fn new(filename: PathBuf, io_mode: IoMode) -> Self {
        Self { filename, io_mode }
    }

    /// The backing sidecar file.
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Load the full mapping. Missing or empty files read as empty.
    pub fn to_mapping(&self) -> Result<Mapping> {
        if !self.filename.exists() {
            return Ok(Mapping::new());
        }
        let contents = fs::read_to_string(&self.filename)?;
        if contents.trim().is_empty() {
            return Ok(Mapping::new());
        }
        let mapping: Option<Mapping> = serde_yml::from_str(&contents)?;
        Ok(mapping.unwrap_or_default())
    }

    /// Look up one top-level key.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.to_mapping()?.get(key).cloned())
    }

    /// Whether a top-level key is present.
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.to_mapping()?.contains_key(key))
    }

    /// The top-level string keys, in file order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .to_mapping()?
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect())
    }

    /// Whether the mapping has no entries.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.to_mapping()?.is_empty())
    }

    /// Set one top-level key (read-modify-write).
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.ensure_writable()?;
        let mut mapping = self.to_mapping()?;
        mapping.insert(Value::from(key), value.into());
        self.dump(&mapping)
    }

    /// Merge entries into the mapping, overwriting colliding keys.
    pub fn update(&self, updates: &Mapping) -> Result<()> {
        self.ensure_writable()?;
        let mut mapping = self.to_mapping()?;
        for (key, value) in updates {
            mapping.insert(key.clone(), value.clone());
        }
        self.dump(&mapping)
    }

    /// Overwrite the mapping wholesale.
    pub fn replace(&self, mapping: Mapping) -> Result<()> {
        self.ensure_writable()?;
        self.dump(&mapping)
    }

    fn dump(&self, mapping: &Mapping) -> Result<()> {
        fs::write(&self.filename, serde_yml::to_string(mapping)?)?;
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.io_mode == IoMode::ReadOnly {
            return Err(ExdirError::ReadOnly);
        }
        Ok(())
    }
}
