//! Length-prefixed vectors of fixed-size elements.
//!
//! Layout: element count as a big-endian `u32`, followed by the elements
//! back to back.

use byteorder::{BigEndian, ByteOrder};

use crate::MerkleTreeError;

const COUNT_PREFIX_LEN: usize = 4;

/// Encode `elements` as a length-prefixed vector.
pub fn serialize_buffer_array_to_vector<B: AsRef<[u8]>>(elements: &[B]) -> Vec<u8> {
    let body_len: usize = elements.iter().map(|e| e.as_ref().len()).sum();
    let mut buf = vec![0u8; COUNT_PREFIX_LEN];
    BigEndian::write_u32(&mut buf, elements.len() as u32);
    buf.reserve(body_len);
    for element in elements {
        buf.extend_from_slice(element.as_ref());
    }
    buf
}

/// Decode a length-prefixed vector of `element_len`-byte elements from the
/// start of `buf`, mapping each element through `decode`.
///
/// Returns the elements and the number of bytes consumed, prefix included.
pub fn deserialize_array_from_vector<T>(
    buf: &[u8],
    element_len: usize,
    decode: impl Fn(&[u8]) -> T,
) -> Result<(Vec<T>, usize), MerkleTreeError> {
    if buf.len() < COUNT_PREFIX_LEN {
        return Err(MerkleTreeError::MalformedEncoding(format!(
            "expected a {COUNT_PREFIX_LEN}-byte count prefix, got {} bytes",
            buf.len()
        )));
    }
    let count = BigEndian::read_u32(&buf[..COUNT_PREFIX_LEN]) as usize;
    let body = &buf[COUNT_PREFIX_LEN..];
    let body_len = count
        .checked_mul(element_len)
        .filter(|len| *len <= body.len())
        .ok_or_else(|| {
            MerkleTreeError::MalformedEncoding(format!(
                "{count} elements of {element_len} bytes exceed the {} bytes available",
                body.len()
            ))
        })?;

    let elements = body[..body_len]
        .chunks_exact(element_len)
        .map(decode)
        .collect();
    Ok((elements, COUNT_PREFIX_LEN + body_len))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn count_prefix_is_big_endian() {
        let buf = serialize_buffer_array_to_vector(&[[0xaau8; 2], [0xbbu8; 2], [0xccu8; 2]]);
        assert_eq!(&buf[..4], &[0, 0, 0, 3]);
        assert_eq!(buf.len(), 4 + 6);
    }

    #[test]
    fn empty_vector() {
        let buf = serialize_buffer_array_to_vector::<[u8; 2]>(&[]);
        assert_eq!(buf, vec![0, 0, 0, 0]);
        let (elements, consumed) = deserialize_array_from_vector(&buf, 2, |e| e.to_vec()).unwrap();
        assert!(elements.is_empty());
        assert_eq!(consumed, 4);
    }

    #[test]
    fn truncated_prefix_is_malformed() {
        assert_matches!(
            deserialize_array_from_vector(&[0, 0, 1], 2, |e| e.to_vec()),
            Err(MerkleTreeError::MalformedEncoding(_))
        );
    }

    #[test]
    fn count_past_end_is_malformed() {
        let mut buf = serialize_buffer_array_to_vector(&[[1u8; 2], [2u8; 2]]);
        buf.pop();
        assert_matches!(
            deserialize_array_from_vector(&buf, 2, |e| e.to_vec()),
            Err(MerkleTreeError::MalformedEncoding(_))
        );
    }

    #[test]
    fn huge_count_is_malformed() {
        let buf = [0xff, 0xff, 0xff, 0xff, 1, 2];
        assert_matches!(
            deserialize_array_from_vector(&buf, 64, |e| e.to_vec()),
            Err(MerkleTreeError::MalformedEncoding(_))
        );
    }
}
