//! Precomputed exemplar embeddings, one group per risk category.
//!
//! Built once from the [`ExemplarLibrary`] at start-up (one embedding pass
//! over every exemplar phrase) and shared read-only afterwards.

use std::time::Instant;

use contractiq_core::{Category, ExemplarLibrary};
use tracing::info;

use crate::vector::{TextEmbedder, cosine_sim};

/// Category → exemplar vectors, in library order.
pub struct EmbeddingIndex {
    categories: Vec<(Category, Vec<Vec<f32>>)>,
    dim: usize,
}

impl EmbeddingIndex {
    /// Embed every exemplar phrase in the library.
    pub fn build(library: &ExemplarLibrary, embedder: &dyn TextEmbedder) -> anyhow::Result<Self> {
        let start = Instant::now();
        let mut categories = Vec::new();
        let mut dim = None;

        for (category, phrases) in library.iter() {
            let texts: Vec<&str> = phrases.iter().map(String::as_str).collect();
            let vectors = embedder.embed_batch(&texts)?;
            anyhow::ensure!(
                vectors.len() == texts.len(),
                "embedder returned {} vectors for {} exemplars of {category}",
                vectors.len(),
                texts.len()
            );

            for v in &vectors {
                let expected = *dim.get_or_insert(v.len());
                anyhow::ensure!(
                    v.len() == expected,
                    "inconsistent embedding dimension for {category}: {} != {expected}",
                    v.len()
                );
            }

            categories.push((category, vectors));
        }

        let dim = dim.ok_or_else(|| anyhow::anyhow!("exemplar library produced no embeddings"))?;
        let exemplars: usize = categories.iter().map(|(_, v)| v.len()).sum();
        info!(
            model = embedder.model_name(),
            categories = categories.len(),
            exemplars,
            dim,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built exemplar embedding index"
        );

        Ok(Self { categories, dim })
    }

    /// Highest similarity to each category's exemplars, in library order.
    pub fn best_matches(&self, embedding: &[f32]) -> Vec<(Category, f32)> {
        self.categories
            .iter()
            .map(|(category, exemplars)| {
                let best = exemplars
                    .iter()
                    .map(|e| cosine_sim(embedding, e))
                    .fold(f32::NEG_INFINITY, f32::max);
                (*category, best)
            })
            .collect()
    }

    /// Embedding dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }
}
