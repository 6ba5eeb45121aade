//! Face Embedding Value Object
//!
//! Represents a face embedding vector produced by an external embedding
//! model. Unlike a fixed-architecture model, the dimension here is a
//! runtime property of whichever model is configured (spec's `MODEL_NAME`
//! selects both the model and its cosine-distance threshold).

use serde::{Deserialize, Serialize};

/// A face embedding vector for facial recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceEmbedding {
    values: Vec<f32>,
}

impl FaceEmbedding {
    /// Creates a new face embedding from a vector.
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Creates an embedding from a byte slice (for database storage).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() % 4 != 0 {
            return None;
        }

        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().unwrap()))
            .collect();

        Some(Self { values })
    }

    /// Converts the embedding to bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Returns the embedding values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Calculates the Euclidean distance to another embedding.
    pub fn distance(&self, other: &FaceEmbedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    /// Calculates the cosine distance to another embedding: `1 - cosine_similarity`.
    /// This is the comparison identity resolution is built on (§4.3):
    /// lower means more similar, `0.0` is identical direction.
    ///
    /// Reference: https://en.wikipedia.org/wiki/Cosine_similarity
    pub fn cosine_distance(&self, other: &FaceEmbedding) -> f32 {
        1.0 - self.cosine_similarity(other)
    }

    /// Calculates the cosine similarity to another embedding (range: -1 to 1).
    pub fn cosine_similarity(&self, other: &FaceEmbedding) -> f32 {
        let dot_product: f32 = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum();

        let magnitude_self = self.values.iter().map(|x| x.powi(2)).sum::<f32>().sqrt();
        let magnitude_other = other.values.iter().map(|x| x.powi(2)).sum::<f32>().sqrt();

        if magnitude_self == 0.0 || magnitude_other == 0.0 {
            return 0.0;
        }

        dot_product / (magnitude_self * magnitude_other)
    }

    /// Normalizes the embedding to unit length (L2 normalization).
    pub fn normalize(&mut self) {
        let magnitude: f32 = self.values.iter().map(|x| x.powi(2)).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in &mut self.values {
                *v /= magnitude;
            }
        }
    }

    /// Returns a normalized copy of this embedding.
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }
}

impl PartialEq for FaceEmbedding {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| (a - b).abs() < f32::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embedding(values: &[f32]) -> FaceEmbedding {
        FaceEmbedding::new(values.to_vec())
    }

    #[test]
    fn cosine_distance_of_identical_embeddings_is_zero() {
        let e1 = embedding(&[0.1, 0.2, 0.3, 0.4]);
        let e2 = embedding(&[0.1, 0.2, 0.3, 0.4]);
        assert!(e1.cosine_distance(&e2).abs() < 1e-5);
    }

    #[test]
    fn cosine_distance_of_opposite_embeddings_is_two() {
        let e1 = embedding(&[1.0, 0.0]);
        let e2 = embedding(&[-1.0, 0.0]);
        assert!((e1.cosine_distance(&e2) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_distance_of_orthogonal_embeddings_is_one() {
        let e1 = embedding(&[1.0, 0.0]);
        let e2 = embedding(&[0.0, 1.0]);
        assert!((e1.cosine_distance(&e2) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn bytes_roundtrip_preserves_values() {
        let original = embedding(&[0.123, -0.5, 1.0]);
        let bytes = original.to_bytes();
        let restored = FaceEmbedding::from_bytes(&bytes).unwrap();
        assert_eq!(original.values(), restored.values());
    }

    #[test]
    fn normalized_embedding_has_unit_length() {
        let e = embedding(&[3.0, 4.0]);
        let normalized = e.normalized();
        let magnitude: f32 = normalized
            .values()
            .iter()
            .map(|x| x.powi(2))
            .sum::<f32>()
            .sqrt();
        assert!((magnitude - 1.0).abs() < 1e-4);
    }
}
