//! Deterministic offline provider. Hashes normalized text into a fixed
//! vector: identical mentions map to identical embeddings, so exact-duplicate
//! behavior is testable without a service. Not a semantic model.

use distill_core::errors::DistillResult;
use distill_core::traits::EmbeddingProvider;

use crate::normalize::normalize;

/// blake3-derived embedding provider for tests and air-gapped runs.
pub struct HashedProvider {
    dimensions: usize,
}

impl HashedProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for HashedProvider {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EmbeddingProvider for HashedProvider {
    fn embed(&self, text: &str) -> DistillResult<Vec<f32>> {
        let normalized = normalize(text);
        let mut out = Vec::with_capacity(self.dimensions);
        let mut chunk = 0u32;
        while out.len() < self.dimensions {
            let hash = blake3::hash(format!("{normalized}|{chunk}").as_bytes());
            for byte in hash.as_bytes() {
                if out.len() == self.dimensions {
                    break;
                }
                out.push(*byte as f32 / 255.0);
            }
            chunk += 1;
        }
        Ok(out)
    }

    fn embed_batch(&self, texts: &[String]) -> DistillResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashed"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_normalized_text_gets_identical_vectors() {
        let provider = HashedProvider::default();
        let a = provider.embed("SAP se cae!").unwrap();
        let b = provider.embed("sap se cae").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn respects_dimensions() {
        let provider = HashedProvider::new(100);
        assert_eq!(provider.embed("x").unwrap().len(), 100);
    }
}
