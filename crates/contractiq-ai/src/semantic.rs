//! Embedding-backed semantic detection.
//!
//! Contract text is cut into rough clauses, each clause is embedded, and a
//! clause is flagged for every category whose closest exemplar clears the
//! similarity threshold. Only the strongest category is kept per clause text.

use std::collections::HashSet;
use std::sync::Arc;

use contractiq_core::{EngineConfig, RiskFinding, SemanticDetector, Severity};
use tracing::{debug, warn};

use crate::index::EmbeddingIndex;
use crate::vector::TextEmbedder;

/// Segments with this many characters or fewer are dropped.
pub const MIN_SEGMENT_CHARS: usize = 10;

const EMBED_BATCH_SIZE: usize = 64;

/// Split contract text into candidate clauses.
///
/// Newlines act as sentence ends, then the text is split on `.`. Each piece
/// is trimmed and kept only if longer than [`MIN_SEGMENT_CHARS`]. This is a
/// cheap heuristic: abbreviations and decimals split mid-clause.
pub fn segment(text: &str) -> Vec<String> {
    text.replace('\n', ". ")
        .split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SEGMENT_CHARS)
        .map(str::to_string)
        .collect()
}

/// Semantic detector backed by a [`TextEmbedder`] and a prebuilt [`EmbeddingIndex`].
pub struct EmbeddingDetector {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<EmbeddingIndex>,
    config: EngineConfig,
}

impl EmbeddingDetector {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        index: Arc<EmbeddingIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    fn embed_segments(&self, segments: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let texts: Vec<&str> = segments.iter().map(String::as_str).collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(EMBED_BATCH_SIZE) {
            embeddings.extend(self.embedder.embed_batch(chunk)?);
        }
        anyhow::ensure!(
            embeddings.len() == segments.len(),
            "embedder returned {} vectors for {} segments",
            embeddings.len(),
            segments.len()
        );
        for embedding in &embeddings {
            anyhow::ensure!(
                embedding.len() == self.index.dim(),
                "embedder returned {}-dim vectors, exemplar index is {}-dim",
                embedding.len(),
                self.index.dim()
            );
        }
        Ok(embeddings)
    }

    fn severity_for(&self, similarity: f32) -> Severity {
        if similarity > self.config.high_confidence {
            Severity::High
        } else {
            Severity::Medium
        }
    }
}

impl SemanticDetector for EmbeddingDetector {
    fn detect(&self, contract_text: &str) -> Vec<RiskFinding> {
        let segments = segment(contract_text);
        if segments.is_empty() {
            return Vec::new();
        }

        let embeddings = match self.embed_segments(&segments) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "embedding failed, skipping semantic detection");
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for (clause, embedding) in segments.iter().zip(&embeddings) {
            for (category, similarity) in self.index.best_matches(embedding) {
                if similarity > self.config.similarity_threshold {
                    candidates.push(RiskFinding::semantic(
                        category,
                        self.severity_for(similarity),
                        clause.clone(),
                        similarity,
                    ));
                }
            }
        }

        let candidate_count = candidates.len();
        let findings = strongest_per_clause(candidates);
        debug!(
            segments = segments.len(),
            candidates = candidate_count,
            findings = findings.len(),
            "semantic detection complete"
        );
        findings
    }

    fn backend(&self) -> &str {
        self.embedder.model_name()
    }
}

/// Keep the highest-confidence candidate per distinct clause text, ordered
/// by confidence descending. Ties keep their original order.
fn strongest_per_clause(mut candidates: Vec<RiskFinding>) -> Vec<RiskFinding> {
    candidates.sort_by(|a, b| {
        let (a, b) = (a.confidence().unwrap_or(0.0), b.confidence().unwrap_or(0.0));
        b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.finding().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingEmbedder, KeywordEmbedder, TruncatingEmbedder, test_library};
    use contractiq_core::Category;

    fn detector(config: EngineConfig) -> EmbeddingDetector {
        let index = EmbeddingIndex::build(&test_library(), &KeywordEmbedder).unwrap();
        EmbeddingDetector::new(Arc::new(KeywordEmbedder), Arc::new(index), config)
    }

    #[test]
    fn segment_splits_on_periods_and_newlines() {
        let segments = segment("First clause is here. Second clause follows\nThird clause on a new line.");
        assert_eq!(
            segments,
            vec![
                "First clause is here",
                "Second clause follows",
                "Third clause on a new line"
            ]
        );
    }

    #[test]
    fn segment_drops_short_pieces() {
        // "0123456789" is exactly 10 characters and is dropped; 11 is kept.
        let segments = segment("Short. 0123456789. 01234567890.  \n\n  ");
        assert_eq!(segments, vec!["01234567890"]);
        assert!(segment("").is_empty());
        assert!(segment("...\n\n").is_empty());
    }

    #[test]
    fn flags_close_clause_as_high() {
        let findings = detector(EngineConfig::default())
            .detect("The Client may Terminate this agreement at will.");
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.category(), Category::Termination);
        assert_eq!(f.severity(), Severity::High);
        assert_eq!(f.finding(), "The Client may Terminate this agreement at will");
        assert!((f.confidence().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn medium_between_thresholds_and_one_category_per_clause() {
        // Equal similarity (1/sqrt(3)) to three categories; the first in
        // library order wins.
        let findings =
            detector(EngineConfig::default()).detect("Termination shifts liability for inventions");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category(), Category::Termination);
        assert_eq!(findings[0].severity(), Severity::Medium);
    }

    #[test]
    fn keeps_strongest_category() {
        // Liability 2/sqrt(5) ≈ 0.894; Termination 1/sqrt(5) ≈ 0.447 is below threshold.
        let findings =
            detector(EngineConfig::default()).detect("Termination of liability and liability caps");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category(), Category::Liability);
        assert_eq!(findings[0].severity(), Severity::High);
    }

    #[test]
    fn unrelated_text_yields_nothing() {
        let findings = detector(EngineConfig::default())
            .detect("The parties will meet quarterly to review progress.");
        assert!(findings.is_empty());
    }

    #[test]
    fn threshold_is_strict() {
        let config = EngineConfig {
            similarity_threshold: 1.0,
            ..EngineConfig::default()
        };
        assert!(detector(config).detect("Client may terminate at will").is_empty());
    }

    #[test]
    fn identical_clauses_collapse() {
        let findings = detector(EngineConfig::default())
            .detect("Client may terminate at will.\nClient may terminate at will.");
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn ordered_by_confidence() {
        let findings = detector(EngineConfig::default()).detect(
            "Termination shifts liability for inventions. Client may terminate at will.",
        );
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].finding(), "Client may terminate at will");
        assert!(findings[0].confidence() >= findings[1].confidence());
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(detector(EngineConfig::default()).detect("").is_empty());
    }

    #[test]
    fn failing_backend_degrades_to_empty() {
        let index = EmbeddingIndex::build(&test_library(), &KeywordEmbedder).unwrap();
        let detector = EmbeddingDetector::new(
            Arc::new(FailingEmbedder),
            Arc::new(index),
            EngineConfig::default(),
        );
        assert!(detector.detect("Client may terminate at will.").is_empty());
        assert_eq!(detector.backend(), "failing-test");
    }

    #[test]
    fn dimension_mismatch_degrades_to_empty() {
        // Index built at 4 dims, clauses embedded at 2: "terminat" and "liab"
        // still line up, so a zip-based similarity would score 1.0 here.
        let index = EmbeddingIndex::build(&test_library(), &KeywordEmbedder).unwrap();
        let detector = EmbeddingDetector::new(
            Arc::new(TruncatingEmbedder { dim: 2 }),
            Arc::new(index),
            EngineConfig::default(),
        );
        assert!(detector.detect("Client may terminate at will.").is_empty());
    }
}
