//! Compact embedding serialization: little-endian f32 BLOBs.

/// Serializes an embedding for the `embedding` BLOB column.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Deserializes a stored BLOB. Empty or misaligned data yields `None`; the
/// ranker treats a missing embedding as a skip, never an error.
pub fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_vectors() {
        let embedding = vec![0.25_f32, -1.5, 3.75, 0.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), embedding);
    }

    #[test]
    fn misaligned_blob_is_none() {
        assert_eq!(bytes_to_embedding(&[1, 2, 3]), None);
        assert_eq!(bytes_to_embedding(&[]), None);
    }
}
