//! Fixed-width byte layout for embedding vectors.
//!
//! Vectors are stored as little-endian IEEE-754 `f32` values with no header,
//! so the buffer length alone carries the dimension.

/// Width of one encoded float in bytes.
pub const FLOAT_WIDTH: usize = std::mem::size_of::<f32>();

/// Errors raised while decoding a vector buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Buffer length is not a whole number of floats.
    #[error("buffer length {0} is not a multiple of {FLOAT_WIDTH}")]
    LengthNotMultiple(usize),
    /// Buffer decodes to a different dimension than expected.
    #[error("expected {expected} dimensions, found {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Encode a vector into its storage bytes.
pub fn encode(vector: &[f32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(vector.len() * FLOAT_WIDTH);
    for value in vector {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    buf
}

/// Decode storage bytes back into a vector.
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % FLOAT_WIDTH != 0 {
        return Err(CodecError::LengthNotMultiple(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(FLOAT_WIDTH)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Decode storage bytes, requiring exactly `dimension` floats.
pub fn decode_with_dimension(bytes: &[u8], dimension: usize) -> Result<Vec<f32>, CodecError> {
    let vector = decode(bytes)?;
    if vector.len() != dimension {
        return Err(CodecError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::{CodecError, decode, decode_with_dimension, encode};
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_exact_values() {
        let vector = vec![0.0, -0.0, 1.5, -3.25, f32::MIN_POSITIVE, f32::MAX, 1e-30];
        let bytes = encode(&vector);
        assert_eq!(bytes.len(), vector.len() * 4);
        let decoded = decode(&bytes).expect("decode");
        let original_bits: Vec<u32> = vector.iter().map(|v| v.to_bits()).collect();
        let decoded_bits: Vec<u32> = decoded.iter().map(|v| v.to_bits()).collect();
        assert_eq!(decoded_bits, original_bits);
    }

    #[test]
    fn layout_is_little_endian_without_header() {
        assert_eq!(encode(&[1.0]), vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(encode(&[]), Vec::<u8>::new());
    }

    #[test]
    fn rejects_partial_floats() {
        assert_eq!(decode(&[0, 0, 0]), Err(CodecError::LengthNotMultiple(3)));
        assert_eq!(
            decode(&[0, 0, 128, 63, 1]),
            Err(CodecError::LengthNotMultiple(5))
        );
    }

    #[test]
    fn dimension_guard_rejects_other_lengths() {
        let bytes = encode(&[1.0, 2.0, 3.0]);
        assert_eq!(
            decode_with_dimension(&bytes, 4),
            Err(CodecError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            decode_with_dimension(&bytes, 3).expect("decode"),
            vec![1.0, 2.0, 3.0]
        );
    }
}
