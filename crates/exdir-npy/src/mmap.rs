//! Memory-mapped NPY files.
//!
//! [`save`] writes a whole array to disk; [`MappedArray`] opens an existing
//! payload and serves reads and in-place writes through a memory map. Reads
//! gather the selected elements into an owned [`Value`] (a detached
//! snapshot); writes scatter a [`Value`] into the mapped region without
//! rewriting the file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::{Mmap, MmapMut};
use ndarray::{ArrayD, IxDyn, SliceInfoElem};

use crate::error::{NpyError, NpyResult};
use crate::header;
use crate::slice::{resolve, selection_shape, Offsets, ResolvedAxis};
use crate::value::{for_each_value, Element, ScalarType, Value};

/// Requested mapping mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapMode {
    ReadOnly,
    ReadWrite,
}

enum Map {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

impl Map {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::ReadOnly(m) => m,
            Self::ReadWrite(m) => m,
        }
    }

    fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Self::ReadOnly(_) => None,
            Self::ReadWrite(m) => Some(m),
        }
    }
}

/// Write a whole array as an NPY file, replacing any existing file.
pub fn save(path: &Path, value: &Value) -> NpyResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&header::encode(value.dtype(), value.shape()))?;
    for_each_value!(value, a => write_elements(&mut writer, a))?;
    writer.flush()?;
    Ok(())
}

fn write_elements<T: Element, W: Write>(writer: &mut W, array: &ArrayD<T>) -> NpyResult<()> {
    let mut buf = [0u8; 8];
    let width = T::DTYPE.size();
    for &element in array.iter() {
        element.write_le(&mut buf[..width]);
        writer.write_all(&buf[..width])?;
    }
    Ok(())
}

/// A memory-mapped NPY payload.
///
/// The map is owned by this handle and released on drop. Two handles over
/// the same file share nothing in memory; reopen to observe another
/// handle's writes.
pub struct MappedArray {
    map: Map,
    dtype: ScalarType,
    shape: Vec<usize>,
    data_offset: usize,
}

impl MappedArray {
    /// Open and map an existing NPY file, validating its header.
    pub fn open(path: &Path, mode: MapMode) -> NpyResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(mode == MapMode::ReadWrite)
            .open(path)?;

        // SAFETY: the mapping is only aliased through this handle, and the
        // store's concurrency model makes external truncation a documented
        // caller hazard rather than something guarded here.
        let map = match mode {
            MapMode::ReadOnly => Map::ReadOnly(unsafe { Mmap::map(&file)? }),
            MapMode::ReadWrite => Map::ReadWrite(unsafe { MmapMut::map_mut(&file)? }),
        };

        let (header, data_offset) = header::parse(map.bytes())?;
        let expected = header.shape.iter().product::<usize>() * header.dtype.size();
        let actual = map.bytes().len() - data_offset;
        if expected != actual {
            return Err(NpyError::LengthMismatch { expected, actual });
        }

        Ok(Self {
            map,
            dtype: header.dtype,
            shape: header.shape,
            data_offset,
        })
    }

    /// Element type of the payload.
    pub fn dtype(&self) -> ScalarType {
        self.dtype
    }

    /// Axis extents of the payload.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes; 0 for a scalar payload.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total element count.
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the mapping rejects writes.
    pub fn is_read_only(&self) -> bool {
        matches!(self.map, Map::ReadOnly(_))
    }

    /// Read the whole payload.
    pub fn read(&self) -> NpyResult<Value> {
        self.read_slice(&[])
    }

    /// Read a selection of the payload into an owned value.
    pub fn read_slice(&self, selector: &[SliceInfoElem]) -> NpyResult<Value> {
        let axes = resolve(selector, &self.shape)?;
        let out_shape = selection_shape(&axes);
        let value = match self.dtype {
            ScalarType::U8 => Value::from(self.gather::<u8>(&axes, &out_shape)),
            ScalarType::I32 => Value::from(self.gather::<i32>(&axes, &out_shape)),
            ScalarType::I64 => Value::from(self.gather::<i64>(&axes, &out_shape)),
            ScalarType::F32 => Value::from(self.gather::<f32>(&axes, &out_shape)),
            ScalarType::F64 => Value::from(self.gather::<f64>(&axes, &out_shape)),
        };
        Ok(value)
    }

    /// Write a value into a selection of the payload, in place.
    ///
    /// The value's shape must equal the selection's shape; a rank-0 value
    /// broadcast-fills the selection.
    pub fn write_slice(&mut self, selector: &[SliceInfoElem], value: &Value) -> NpyResult<()> {
        if value.dtype() != self.dtype {
            return Err(NpyError::DtypeMismatch {
                expected: self.dtype,
                actual: value.dtype(),
            });
        }
        let axes = resolve(selector, &self.shape)?;
        let out_shape = selection_shape(&axes);
        if !value.is_scalar() && value.shape() != out_shape.as_slice() {
            return Err(NpyError::ShapeMismatch {
                expected: out_shape,
                actual: value.shape().to_vec(),
            });
        }
        for_each_value!(value, a => self.scatter(&axes, a))
    }

    fn gather<T: Element>(&self, axes: &[ResolvedAxis], out_shape: &[usize]) -> ArrayD<T> {
        let data = &self.map.bytes()[self.data_offset..];
        let width = T::DTYPE.size();
        let mut out = Vec::with_capacity(out_shape.iter().product());
        for offset in Offsets::new(axes, &self.shape) {
            let at = offset * width;
            out.push(T::read_le(&data[at..at + width]));
        }
        ArrayD::from_shape_vec(IxDyn(out_shape), out)
            .expect("selection length matches its shape")
    }

    fn scatter<T: Element>(&mut self, axes: &[ResolvedAxis], src: &ArrayD<T>) -> NpyResult<()> {
        let shape = self.shape.clone();
        let offset = self.data_offset;
        let width = T::DTYPE.size();
        let data = &mut self.map.bytes_mut().ok_or(NpyError::ReadOnlyMap)?[offset..];

        if src.ndim() == 0 {
            let fill = *src.iter().next().expect("rank-0 array has one element");
            for target in Offsets::new(axes, &shape) {
                fill.write_le(&mut data[target * width..target * width + width]);
            }
        } else {
            for (target, &element) in Offsets::new(axes, &shape).zip(src.iter()) {
                element.write_le(&mut data[target * width..target * width + width]);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for MappedArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedArray")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
