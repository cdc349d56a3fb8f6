//! Error types for the NPY codec.

use thiserror::Error;

use crate::value::ScalarType;

/// Errors from NPY encode/decode and selection operations.
#[derive(Debug, Error)]
pub enum NpyError {
    /// The file does not start with the NPY magic string.
    #[error("not an NPY file (bad magic)")]
    BadMagic,

    /// The NPY format version is not supported.
    #[error("unsupported NPY version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// The header dict is malformed or truncated.
    #[error("malformed NPY header: {0}")]
    BadHeader(String),

    /// The dtype descriptor is outside the supported set.
    #[error("unsupported dtype descriptor {0:?}")]
    UnsupportedDescr(String),

    /// Fortran-order payloads are not supported; arrays are C-order only.
    #[error("Fortran-order arrays are not supported")]
    FortranOrder,

    /// The data section does not match the size implied by the header.
    #[error("payload length mismatch: header implies {expected} bytes, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// An index selector fell outside the axis.
    #[error("index {index} is out of bounds for axis {axis} with length {len}")]
    OutOfBounds {
        axis: usize,
        index: isize,
        len: usize,
    },

    /// The selector names more axes than the array has.
    #[error("selector has {given} axes but the array has {ndim}")]
    TooManyAxes { given: usize, ndim: usize },

    /// The selector is structurally invalid (zero step, NewAxis, ...).
    #[error("invalid selector: {0}")]
    BadSelector(String),

    /// The value's shape does not match the selection's shape.
    #[error("value shape {actual:?} does not match selection shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// The value's element type does not match the mapped array's.
    #[error("dtype mismatch: array is {expected}, value is {actual}")]
    DtypeMismatch {
        expected: ScalarType,
        actual: ScalarType,
    },

    /// Attempted to write through a read-only mapping.
    #[error("array is mapped read-only")]
    ReadOnlyMap,

    /// I/O error from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for NPY operations.
pub type NpyResult<T> = Result<T, NpyError>;
