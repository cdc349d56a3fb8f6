//! NPY format v1.0 header encoding and parsing.
//!
//! On-disk layout:
//!
//! ```text
//! [6 bytes: magic "\x93NUMPY"]
//! [1 byte: major version][1 byte: minor version]
//! [2 bytes: header length (little-endian u16)]
//! [header dict, space-padded, '\n'-terminated]
//! [raw element data, C order, little-endian]
//! ```
//!
//! The dict is a Python literal of the form
//! `{'descr': '<i8', 'fortran_order': False, 'shape': (2, 3), }`. The full
//! prelude is padded to a multiple of 64 bytes so the data section stays
//! aligned for every supported element width.

use crate::error::{NpyError, NpyResult};
use crate::value::ScalarType;

pub(crate) const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Prelude bytes before the dict: magic + version + header length.
const PRELUDE: usize = 10;

/// Parsed header: dtype and shape of the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub dtype: ScalarType,
    pub shape: Vec<usize>,
}

/// Encode the full prelude (magic through the terminating newline).
pub(crate) fn encode(dtype: ScalarType, shape: &[usize]) -> Vec<u8> {
    let shape_repr = match shape.len() {
        0 => "()".to_string(),
        1 => format!("({},)", shape[0]),
        _ => {
            let inner = shape
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("({inner})")
        }
    };
    let dict = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        dtype.descr(),
        shape_repr
    );

    let unpadded = PRELUDE + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(PRELUDE + header_len);
    out.extend_from_slice(MAGIC);
    out.push(1);
    out.push(0);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(padding));
    out.push(b'\n');
    out
}

/// Parse the header from the start of a file. Returns the header and the
/// byte offset where the data section begins.
pub(crate) fn parse(bytes: &[u8]) -> NpyResult<(Header, usize)> {
    if bytes.len() < PRELUDE {
        return Err(NpyError::BadHeader(
            "file is shorter than the fixed prelude".into(),
        ));
    }
    if &bytes[..6] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    let (major, minor) = (bytes[6], bytes[7]);
    if major != 1 {
        return Err(NpyError::UnsupportedVersion { major, minor });
    }

    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let data_offset = PRELUDE + header_len;
    if bytes.len() < data_offset {
        return Err(NpyError::BadHeader("truncated header dict".into()));
    }
    let dict = std::str::from_utf8(&bytes[PRELUDE..data_offset])
        .map_err(|_| NpyError::BadHeader("header dict is not UTF-8".into()))?;

    let descr = str_field(dict, "descr")?;
    let dtype = ScalarType::from_descr(descr)
        .ok_or_else(|| NpyError::UnsupportedDescr(descr.to_string()))?;

    if bool_field(dict, "fortran_order")? {
        return Err(NpyError::FortranOrder);
    }

    let shape = shape_field(dict)?;
    Ok((Header { dtype, shape }, data_offset))
}

/// The text immediately following `'key':` in the dict.
fn field<'a>(dict: &'a str, key: &str) -> NpyResult<&'a str> {
    let pattern = format!("'{key}':");
    let at = dict
        .find(&pattern)
        .ok_or_else(|| NpyError::BadHeader(format!("missing '{key}' field")))?;
    Ok(dict[at + pattern.len()..].trim_start())
}

fn str_field<'a>(dict: &'a str, key: &str) -> NpyResult<&'a str> {
    let rest = field(dict, key)?;
    let rest = rest
        .strip_prefix('\'')
        .ok_or_else(|| NpyError::BadHeader(format!("'{key}' is not a string")))?;
    let end = rest
        .find('\'')
        .ok_or_else(|| NpyError::BadHeader(format!("unterminated '{key}' string")))?;
    Ok(&rest[..end])
}

fn bool_field(dict: &str, key: &str) -> NpyResult<bool> {
    let rest = field(dict, key)?;
    if rest.starts_with("True") {
        Ok(true)
    } else if rest.starts_with("False") {
        Ok(false)
    } else {
        Err(NpyError::BadHeader(format!("'{key}' is not a boolean")))
    }
}

fn shape_field(dict: &str) -> NpyResult<Vec<usize>> {
    let rest = field(dict, "shape")?;
    let rest = rest
        .strip_prefix('(')
        .ok_or_else(|| NpyError::BadHeader("'shape' is not a tuple".into()))?;
    let end = rest
        .find(')')
        .ok_or_else(|| NpyError::BadHeader("unterminated 'shape' tuple".into()))?;
    rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| NpyError::BadHeader(format!("bad shape entry {part:?}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_parse_roundtrip() {
        for (dtype, shape) in [
            (ScalarType::I64, vec![2, 3]),
            (ScalarType::F64, vec![5]),
            (ScalarType::U8, vec![]),
            (ScalarType::F32, vec![1, 1, 7]),
        ] {
            let bytes = encode(dtype, &shape);
            let (header, offset) = parse(&bytes).unwrap();
            assert_eq!(header.dtype, dtype);
            assert_eq!(header.shape, shape);
            assert_eq!(offset, bytes.len());
        }
    }

    #[test]
    fn prelude_is_aligned() {
        let bytes = encode(ScalarType::F64, &[10, 20]);
        assert_eq!(bytes.len() % 64, 0);
        assert_eq!(*bytes.last().unwrap(), b'\n');
    }

    #[test]
    fn bad_magic() {
        let mut bytes = encode(ScalarType::I64, &[2]);
        bytes[0] = b'X';
        assert!(matches!(parse(&bytes), Err(NpyError::BadMagic)));
    }

    #[test]
    fn unsupported_version() {
        let mut bytes = encode(ScalarType::I64, &[2]);
        bytes[6] = 3;
        assert!(matches!(
            parse(&bytes),
            Err(NpyError::UnsupportedVersion { major: 3, .. })
        ));
    }

    #[test]
    fn fortran_order_rejected() {
        let dict = "{'descr': '<i8', 'fortran_order': True, 'shape': (2,), }";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        assert!(matches!(parse(&bytes), Err(NpyError::FortranOrder)));
    }

    #[test]
    fn unknown_descr_rejected() {
        let dict = "{'descr': '<c16', 'fortran_order': False, 'shape': (2,), }";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        assert!(matches!(parse(&bytes), Err(NpyError::UnsupportedDescr(_))));
    }

    #[test]
    fn scalar_shape() {
        let bytes = encode(ScalarType::F64, &[]);
        let (header, _) = parse(&bytes).unwrap();
        assert!(header.shape.is_empty());
    }
}
