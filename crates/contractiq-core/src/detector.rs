//! Semantic detection seam.
//!
//! The engine holds one [`SemanticDetector`] chosen at start-up: an
//! embedding-backed implementation when a model is available, otherwise
//! [`NoopDetector`].

use crate::finding::RiskFinding;

/// Similarity thresholds and summary length used by an analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// A category matches when its best similarity is strictly above this.
    pub similarity_threshold: f32,
    /// Matches strictly above this are `High`, otherwise `Medium`.
    pub high_confidence: f32,
    /// Characters of contract text kept in the summary.
    pub summary_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.45,
            high_confidence: 0.65,
            summary_chars: 200,
        }
    }
}

/// Produces semantic findings for raw contract text.
///
/// Implementations must not fail: an unavailable backend yields no findings.
pub trait SemanticDetector: Send + Sync {
    fn detect(&self, contract_text: &str) -> Vec<RiskFinding>;

    /// Short backend name for logs and reports.
    fn backend(&self) -> &str;
}

/// Detector used when no embedding backend is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDetector;

impl SemanticDetector for NoopDetector {
    fn detect(&self, _contract_text: &str) -> Vec<RiskFinding> {
        Vec::new()
    }

    fn backend(&self) -> &str {
        "disabled"
    }
}
