//! NPY array-file codec for exdir.
//!
//! Reads and writes the NPY format (v1.0, little-endian, C order) that
//! backs every exdir dataset's `data.npy` payload. The codec is consumed
//! through a deliberately narrow interface:
//!
//! - [`save`] -- write a whole array to disk
//! - [`MappedArray`] -- memory-map an existing payload for reads and
//!   in-place writes, in read-only or read-write mode
//! - [`Value`] -- an owned, dynamically typed array that moves through the
//!   dataset transform pipeline
//!
//! # Design Rules
//!
//! 1. The payload file is the single source of truth; this crate holds no
//!    cache beyond the mapping itself.
//! 2. Reads gather into owned values (detached snapshots). Mutating a read
//!    result never writes back.
//! 3. In-place writes never change the payload's shape or dtype; changing
//!    either means rewriting the file with [`save`].
//! 4. Malformed files are rejected on open, never reinterpreted.

pub mod error;
pub mod mmap;
pub mod value;

mod header;
mod slice;

pub use error::{NpyError, NpyResult};
pub use mmap::{save, MapMode, MappedArray};
pub use value::{Element, ScalarType, Value};

// The selector vocabulary is ndarray's; re-export it so callers do not
// need a direct ndarray dependency to address subsets.
pub use ndarray;
pub use ndarray::SliceInfoElem;
