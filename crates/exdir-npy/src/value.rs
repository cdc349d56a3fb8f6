//! Dynamically typed array values.
//!
//! A [`Value`] is an owned n-dimensional array whose element type is one of
//! a closed set of numeric dtypes. It is the unit that moves through the
//! dataset transform pipeline: reads gather into a `Value`, writes scatter
//! from one.

use std::fmt;

use ndarray::{arr0, Array, Array1, ArrayD, Dimension};

/// The closed set of supported element types, with their NPY descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    U8,
    I32,
    I64,
    F32,
    F64,
}

impl ScalarType {
    /// NPY `descr` string for this type (little-endian).
    pub fn descr(&self) -> &'static str {
        match self {
            Self::U8 => "|u1",
            Self::I32 => "<i4",
            Self::I64 => "<i8",
            Self::F32 => "<f4",
            Self::F64 => "<f8",
        }
    }

    /// Parse an NPY `descr` string.
    pub fn from_descr(descr: &str) -> Option<Self> {
        match descr {
            "|u1" | "u1" => Some(Self::U8),
            "<i4" => Some(Self::I32),
            "<i8" => Some(Self::I64),
            "<f4" => Some(Self::F32),
            "<f8" => Some(Self::F64),
            _ => None,
        }
    }

    /// Element width in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I32 | Self::F32 => 4,
            Self::I64 | Self::F64 => 8,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "u8",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        };
        write!(f, "{name}")
    }
}

/// An element type storable in an NPY payload.
pub trait Element: Copy + PartialEq + fmt::Debug + 'static {
    /// The dtype tag for this element type.
    const DTYPE: ScalarType;

    /// Decode one element from little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode one element into little-endian bytes.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_element {
    ($t:ty, $dtype:ident) => {
        impl Element for $t {
            const DTYPE: ScalarType = ScalarType::$dtype;

            fn read_le(bytes: &[u8]) -> Self {
                Self::from_le_bytes(bytes.try_into().unwrap())
            }

            fn write_le(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

impl_element!(u8, U8);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(f32, F32);
impl_element!(f64, F64);

/// An owned array of any supported dtype.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    U8(ArrayD<u8>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Dispatch over every `Value` variant, binding the inner array.
macro_rules! for_each_value {
    ($value:expr, $a:ident => $e:expr) => {
        match $value {
            Value::U8($a) => $e,
            Value::I32($a) => $e,
            Value::I64($a) => $e,
            Value::F32($a) => $e,
            Value::F64($a) => $e,
        }
    };
}

pub(crate) use for_each_value;

impl Value {
    /// The element type tag.
    pub fn dtype(&self) -> ScalarType {
        match self {
            Self::U8(_) => ScalarType::U8,
            Self::I32(_) => ScalarType::I32,
            Self::I64(_) => ScalarType::I64,
            Self::F32(_) => ScalarType::F32,
            Self::F64(_) => ScalarType::F64,
        }
    }

    /// Axis extents.
    pub fn shape(&self) -> &[usize] {
        for_each_value!(self, a => a.shape())
    }

    /// Number of axes; 0 for a scalar.
    pub fn ndim(&self) -> usize {
        for_each_value!(self, a => a.ndim())
    }

    /// Total element count.
    pub fn size(&self) -> usize {
        for_each_value!(self, a => a.len())
    }

    /// Whether this is a rank-0 (scalar) value.
    pub fn is_scalar(&self) -> bool {
        self.ndim() == 0
    }
}

macro_rules! impl_value_from {
    ($t:ty, $variant:ident) => {
        impl<D: Dimension> From<Array<$t, D>> for Value {
            fn from(array: Array<$t, D>) -> Self {
                Value::$variant(array.into_dyn())
            }
        }

        impl From<$t> for Value {
            fn from(scalar: $t) -> Self {
                Value::$variant(arr0(scalar).into_dyn())
            }
        }

        impl From<Vec<$t>> for Value {
            fn from(vec: Vec<$t>) -> Self {
                Value::$variant(Array1::from(vec).into_dyn())
            }
        }
    };
}

impl_value_from!(u8, U8);
impl_value_from!(i32, I32);
impl_value_from!(i64, I64);
impl_value_from!(f32, F32);
impl_value_from!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn descr_roundtrip() {
        for dtype in [
            ScalarType::U8,
            ScalarType::I32,
            ScalarType::I64,
            ScalarType::F32,
            ScalarType::F64,
        ] {
            assert_eq!(ScalarType::from_descr(dtype.descr()), Some(dtype));
        }
    }

    #[test]
    fn unknown_descr() {
        assert_eq!(ScalarType::from_descr("<c16"), None);
        assert_eq!(ScalarType::from_descr(">i8"), None);
    }

    #[test]
    fn scalar_value() {
        let v = Value::from(42i64);
        assert_eq!(v.ndim(), 0);
        assert_eq!(v.size(), 1);
        assert!(v.is_scalar());
        assert_eq!(v.dtype(), ScalarType::I64);
    }

    #[test]
    fn vec_value() {
        let v = Value::from(vec![1.0f64, 2.0, 3.0]);
        assert_eq!(v.shape(), &[3]);
        assert_eq!(v.dtype(), ScalarType::F64);
    }

    #[test]
    fn array_value() {
        let v = Value::from(array![[1i64, 2], [3, 4]]);
        assert_eq!(v.shape(), &[2, 2]);
        assert_eq!(v.size(), 4);
        assert!(!v.is_scalar());
    }

    #[test]
    fn element_le_roundtrip() {
        let mut buf = [0u8; 8];
        1234567890123i64.write_le(&mut buf);
        assert_eq!(i64::read_le(&buf), 1234567890123);

        let mut buf = [0u8; 4];
        (-2.5f32).write_le(&mut buf);
        assert_eq!(f32::read_le(&buf), -2.5);
    }
}
