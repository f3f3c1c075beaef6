//! Text embeddings
//!
//! The encoder is a black box behind the [`Embedder`] trait. The bundled
//! [`HashEmbedder`] implements FNV-1a feature hashing over unigrams and
//! bigrams: no model files, fully deterministic.
//!
//! Embedders are not required to return unit vectors. Callers normalize with
//! [`normalize_l2`] before using inner product as cosine similarity.

use crate::error::{HubError, Result};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Maps processed text to a dense vector of fixed dimension.
pub trait Embedder: Send + Sync {
    /// Embed already-preprocessed text.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Output dimension.
    fn dims(&self) -> usize;
}

/// Hash embedder using FNV-1a
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    /// Embedding dimension (default: 384)
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbedder {
    /// Create embedder with specified dimension
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    /// Embed text into an unnormalized vector.
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        let tokens: Vec<&str> = text.split_whitespace().collect();

        for token in &tokens {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);
        }
        // Bigrams carry word order at half weight.
        for pair in tokens.windows(2) {
            let joined = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, joined.as_bytes(), 0.5);
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (hash % self.dim as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dims(&self) -> usize {
        self.dim
    }
}

/// Embed `text`, rejecting output with NaN or infinite components.
pub fn embed_checked(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let vector = embedder.embed(text)?;
    if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
        return Err(HubError::Encoder(format!(
            "component {pos} of the embedding for {text:?} is not finite"
        )));
    }
    Ok(vector)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Inner product of two equal-length vectors.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity via inner product of normalized copies, clamped to
/// `[-1, 1]` against rounding. Mismatched lengths score 0.
#[must_use]
pub fn similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    normalize_l2(&mut a);
    normalize_l2(&mut b);
    dot(&a, &b).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenEmbedder;

    impl Embedder for BrokenEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5, f32::NAN])
        }

        fn dims(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_embed_checked_rejects_non_finite() {
        let err = embed_checked(&BrokenEmbedder, "sort list").unwrap_err();
        assert!(matches!(err, HubError::Encoder(_)));
        assert_eq!(err.code(), "encoder");
        assert!(embed_checked(&HashEmbedder::new(8), "sort list").is_ok());
    }

    #[test]
    fn test_hash_embedding_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        assert_eq!(embedder.embed_text("sort list"), embedder.embed_text("sort list"));
    }

    #[test]
    fn test_hash_embedding_dimension() {
        let embedder = HashEmbedder::new(32);
        assert_eq!(embedder.embed_text("anything at all").len(), 32);
        assert_eq!(embedder.dims(), 32);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed_text("");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_tokens_increase_similarity() {
        let embedder = HashEmbedder::new(384);
        let query = embedder.embed_text("sort dict value");
        let close = embedder.embed_text("sort dict value python");
        let far = embedder.embed_text("docker container network");
        assert!(similarity(&query, &close) > similarity(&query, &far));
    }

    #[test]
    fn test_normalize_l2_unit_length() {
        let mut v = vec![3.0, 4.0];
        normalize_l2(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_is_noop() {
        let mut v = vec![0.0; 4];
        normalize_l2(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_similarity_bounds() {
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        assert!((similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!((similarity(&a, &b) + 1.0).abs() < 1e-6);
        assert_eq!(similarity(&a, &[1.0]), 0.0);
    }
}
