//! Deterministic embedders for tests.

use contractiq_core::{Category, ExemplarLibrary};

use crate::vector::TextEmbedder;

/// Bag-of-keywords embedder: one axis per keyword stem, valued by count.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub const KEYWORDS: [&'static str; 4] = ["terminat", "liab", "pay", "invent"];
    pub const DIM: usize = Self::KEYWORDS.len();

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        Self::KEYWORDS
            .iter()
            .map(|k| lower.matches(k).count() as f32)
            .collect()
    }
}

impl TextEmbedder for KeywordEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Always fails, like a backend whose session died.
pub struct FailingEmbedder;

impl TextEmbedder for FailingEmbedder {
    fn embed_batch(&self, _texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("inference session unavailable")
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// [`KeywordEmbedder`] cut down to the first `dim` axes.
pub struct TruncatingEmbedder {
    pub dim: usize,
}

impl TextEmbedder for TruncatingEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = KeywordEmbedder::vector(t);
                v.truncate(self.dim);
                v
            })
            .collect())
    }

    fn model_name(&self) -> &str {
        "truncating-test"
    }
}

/// Three categories. Termination and Liability each carry one exemplar with
/// no keyword, which embeds to a zero vector.
pub fn test_library() -> ExemplarLibrary {
    ExemplarLibrary::new(vec![
        (
            Category::Termination,
            vec![
                "terminate at any time without notice".into(),
                "immediate cancellation by client".into(),
            ],
        ),
        (
            Category::Liability,
            vec![
                "unlimited liability for contractor".into(),
                "contractor bears all risk".into(),
            ],
        ),
        (
            Category::IntellectualProperty,
            vec!["assignment of all past and future inventions".into()],
        ),
    ])
    .expect("test library is valid")
}
