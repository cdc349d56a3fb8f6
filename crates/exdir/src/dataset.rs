//! Datasets: typed objects holding one array payload.
//!
//! The payload lives in `data.npy` inside the object directory and is
//! memory-mapped lazily, on first access, in the mode the store was opened
//! with. The map belongs to this handle alone; a cloned or reopened handle
//! maps independently and observes other handles' writes only through the
//! file.
//!
//! Reads and writes pass through the transform plugin pipeline. A write
//! that preserves the payload's shape updates the mapped file in place; a
//! whole-dataset reassignment with a different shape discards the map and
//! rewrites the file from scratch.

use std::path::PathBuf;

use serde_yml::Value as YamlValue;
use tracing::debug;

use exdir_npy::{MapMode, MappedArray, ScalarType, SliceInfoElem, Value};

use crate::error::{ExdirError, Result};
use crate::object::{IoMode, Object};

/// Filename of the array payload inside a dataset directory.
pub const DATA_FILENAME: &str = "data.npy";

/// A typed object with one array payload.
#[derive(Debug)]
pub struct Dataset {
    object: Object,
    map: Option<MappedArray>,
}

// A cloned handle starts unmapped: handles never share a map.
impl Clone for Dataset {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            map: None,
        }
    }
}

impl Dataset {
    pub(crate) fn new(object: Object) -> Self {
        Self { object, map: None }
    }

    /// Absolute path of the payload file.
    pub fn data_filename(&self) -> PathBuf {
        self.directory().join(DATA_FILENAME)
    }

    /// Read the whole payload through the plugin pipeline.
    pub fn read(&mut self) -> Result<Value> {
        self.read_slice(&[])
    }

    /// Read a selection of the payload through the plugin pipeline.
    ///
    /// A rank-0 dataset ignores the selector and returns the scalar.
    pub fn read_slice(&mut self, selector: &[SliceInfoElem]) -> Result<Value> {
        let value = {
            let map = self.mapped()?;
            if map.ndim() == 0 {
                map.read()?
            } else {
                map.read_slice(selector)?
            }
        };
        self.check_plugins_available()?;
        let attributes = self.attrs().to_mapping()?;
        self.object.plugins().run_read(value, &attributes)
    }

    /// Write the whole payload in place (shape-preserving).
    pub fn write(&mut self, value: impl Into<Value>) -> Result<()> {
        self.write_slice(&[], value)
    }

    /// Write a value into a selection of the payload, in place.
    ///
    /// The value passes through the plugin write pipeline first; attribute
    /// contributions are merged and required plugins are recorded in the
    /// metadata sidecar.
    pub fn write_slice(&mut self, selector: &[SliceInfoElem], value: impl Into<Value>) -> Result<()> {
        self.object.ensure_writable()?;
        let (value, attributes, plugin_table) = self.object.plugins().run_write(value.into())?;
        self.attrs().update(&attributes)?;
        self.meta().set("plugins", YamlValue::Mapping(plugin_table))?;
        self.mapped_mut()?.write_slice(selector, &value)?;
        Ok(())
    }

    /// Reassign the whole dataset.
    ///
    /// A shape change discards the mapping and rewrites the payload file
    /// from scratch; an unchanged shape takes the ordinary in-place write
    /// path with a full-range selector. Shapes are compared, element types
    /// deliberately are not.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<()> {
        self.object.ensure_writable()?;
        let value = value.into();
        let on_disk = self.mapped()?.shape().to_vec();
        if on_disk != value.shape() {
            self.reset_data(value)
        } else {
            self.write(value)
        }
    }

    /// Rewrite the payload file whole, through the write pipeline.
    pub(crate) fn reset_data(&mut self, value: Value) -> Result<()> {
        let (value, attributes, plugin_table) = self.object.plugins().run_write(value)?;
        exdir_npy::save(&self.data_filename(), &value)?;
        self.attrs().update(&attributes)?;
        self.meta().set("plugins", YamlValue::Mapping(plugin_table))?;
        // Drop the stale mapping; the next access remaps lazily.
        self.map = None;
        debug!(dataset = %self.name(), shape = ?value.shape(), "payload rewritten");
        Ok(())
    }

    /// Axis extents, read through the full pipeline.
    pub fn shape(&mut self) -> Result<Vec<usize>> {
        Ok(self.read()?.shape().to_vec())
    }

    /// Total element count, read through the full pipeline.
    pub fn size(&mut self) -> Result<usize> {
        Ok(self.read()?.size())
    }

    /// Number of axes, read through the full pipeline.
    pub fn ndim(&mut self) -> Result<usize> {
        Ok(self.read()?.ndim())
    }

    /// Element type, read through the full pipeline.
    pub fn dtype(&mut self) -> Result<ScalarType> {
        Ok(self.read()?.dtype())
    }

    /// First-axis extent. Rank-0 datasets have no length.
    pub fn len(&mut self) -> Result<usize> {
        let shape = self.shape()?;
        match shape.first() {
            Some(&extent) => Ok(extent),
            None => Err(ExdirError::ScalarLength(self.name())),
        }
    }

    /// Iterate over the first axis. Each yielded value is an independent
    /// read -- a detached snapshot that never writes back.
    pub fn rows(&mut self) -> Result<Rows<'_>> {
        let shape = self.shape()?;
        match shape.first() {
            Some(&extent) => Ok(Rows {
                dataset: self,
                index: 0,
                extent,
            }),
            None => Err(ExdirError::ScalarIteration(self.name())),
        }
    }

    fn map_mode(&self) -> MapMode {
        match self.io_mode() {
            IoMode::ReadOnly => MapMode::ReadOnly,
            IoMode::ReadWrite => MapMode::ReadWrite,
        }
    }

    fn mapped(&mut self) -> Result<&MappedArray> {
        self.ensure_mapped()?;
        Ok(self.map.as_ref().expect("payload mapped above"))
    }

    fn mapped_mut(&mut self) -> Result<&mut MappedArray> {
        self.ensure_mapped()?;
        Ok(self.map.as_mut().expect("payload mapped above"))
    }

    fn ensure_mapped(&mut self) -> Result<()> {
        if self.map.is_none() {
            let mapped = MappedArray::open(&self.data_filename(), self.map_mode())?;
            self.map = Some(mapped);
        }
        Ok(())
    }

    /// Every plugin recorded at write time must still be registered.
    fn check_plugins_available(&self) -> Result<()> {
        let meta_map = self.meta().to_mapping()?;
        let Some(YamlValue::Mapping(table)) = meta_map.get("plugins") else {
            return Ok(());
        };
        for key in table.keys() {
            if let Some(identifier) = key.as_str() {
                if !self.object.plugins().is_registered(identifier) {
                    return Err(ExdirError::PluginUnavailable {
                        plugin: identifier.to_string(),
                        dataset: self.name(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl std::ops::Deref for Dataset {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}

/// Iterator over a dataset's first axis.
pub struct Rows<'a> {
    dataset: &'a mut Dataset,
    index: usize,
    extent: usize,
}

impl std::fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("index", &self.index)
            .field("extent", &self.extent)
            .finish()
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.extent {
            return None;
        }
        let item = self
            .dataset
            .read_slice(&[SliceInfoElem::Index(self.index as isize)]);
        self.index += 1;
        Some(item)
    }
}
