//! The hybrid risk engine: keyword rules plus semantic detection, scored.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::detector::{EngineConfig, NoopDetector, SemanticDetector};
use crate::finding::{AnalysisResult, RiskFinding};
use crate::rules::{self, RuleHit};
use crate::scoring;

/// Analyzes contract text against the keyword rules and a semantic detector.
///
/// Cheap to share: the detector (and any embedding index behind it) sits
/// behind an `Arc` and is only read during analysis.
#[derive(Clone)]
pub struct RiskEngine {
    detector: Arc<dyn SemanticDetector>,
    config: EngineConfig,
}

impl RiskEngine {
    pub fn new(detector: Arc<dyn SemanticDetector>, config: EngineConfig) -> Self {
        Self { detector, config }
    }

    /// Engine with semantic detection disabled.
    pub fn rules_only(config: EngineConfig) -> Self {
        Self::new(Arc::new(NoopDetector), config)
    }

    /// Name of the active semantic backend.
    pub fn backend(&self) -> &str {
        self.detector.backend()
    }

    /// Analyze one contract. Never fails; a missing embedding backend only
    /// means fewer findings.
    pub fn analyze(&self, contract_text: &str, user_expectations: &str) -> AnalysisResult {
        let start = Instant::now();
        let rule_hits = rules::detect(contract_text, user_expectations);
        let semantic = self.detector.detect(contract_text);
        self.finish(rule_hits, semantic, contract_text, start)
    }

    /// Like [`analyze`](Self::analyze), but runs semantic detection on the
    /// blocking pool while the rules are evaluated on the caller's task.
    pub async fn analyze_concurrent(
        &self,
        contract_text: &str,
        user_expectations: &str,
    ) -> AnalysisResult {
        let start = Instant::now();

        let detector = Arc::clone(&self.detector);
        let text = contract_text.to_owned();
        let semantic_task = tokio::task::spawn_blocking(move || detector.detect(&text));

        let rule_hits = rules::detect(contract_text, user_expectations);

        let semantic = match semantic_task.await {
            Ok(findings) => findings,
            Err(e) => {
                warn!(error = %e, "semantic detection task failed, using rule findings only");
                Vec::new()
            }
        };

        self.finish(rule_hits, semantic, contract_text, start)
    }

    fn finish(
        &self,
        rule_hits: Vec<RuleHit>,
        semantic: Vec<RiskFinding>,
        contract_text: &str,
        start: Instant,
    ) -> AnalysisResult {
        let rule_count = rule_hits.len();
        let semantic_count = semantic.len();
        let result = scoring::aggregate(
            rule_hits,
            semantic,
            contract_text,
            self.config.summary_chars,
        );
        debug!(
            backend = self.detector.backend(),
            rule_findings = rule_count,
            semantic_candidates = semantic_count,
            accepted = result.risks.len(),
            score = result.score,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "contract analyzed"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{Category, ExpectationCheck, RiskFinding, Severity, Source};

    /// Returns a fixed set of findings regardless of input.
    struct FixedDetector(Vec<RiskFinding>);

    impl SemanticDetector for FixedDetector {
        fn detect(&self, _contract_text: &str) -> Vec<RiskFinding> {
            self.0.clone()
        }

        fn backend(&self) -> &str {
            "fixed"
        }
    }

    fn ip_engine() -> RiskEngine {
        let finding = RiskFinding::semantic(
            Category::IntellectualProperty,
            Severity::High,
            "Contractor assigns all past and future inventions to the client",
            0.70,
        );
        RiskEngine::new(
            Arc::new(FixedDetector(vec![finding])),
            EngineConfig::default(),
        )
    }

    #[test]
    fn disabled_backend_yields_rule_findings_only() {
        let engine = RiskEngine::rules_only(EngineConfig::default());
        assert_eq!(engine.backend(), "disabled");

        let text = "Fees are payable within 90 days. Contractor has unlimited liability.";
        let result = engine.analyze(text, "net 30");

        let expected: Vec<RiskFinding> = rules::detect(text, "net 30")
            .into_iter()
            .map(|h| h.finding)
            .collect();
        assert_eq!(result.risks.len(), expected.len());
        for f in &expected {
            assert!(result.risks.contains(f));
        }
        assert!(result.risks.iter().all(|r| r.source() == Source::Rule));
        assert_eq!(result.score, 40);
    }

    #[test]
    fn semantic_finding_flagged() {
        let result = ip_engine().analyze("Plain services agreement text.", "");
        assert_eq!(result.score, 85);
        assert_eq!(result.risks.len(), 1);
        assert_eq!(
            result.risks[0].expectation_check(),
            ExpectationCheck::AIFlagged
        );
    }

    #[test]
    fn analyze_is_idempotent() {
        let engine = ip_engine();
        let text = "Payment within 90 days. Terminate immediately without notice.";
        let first = engine.analyze(text, "net 15");
        let second = engine.analyze(text, "net 15");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_contract() {
        let result = RiskEngine::rules_only(EngineConfig::default()).analyze("", "");
        assert_eq!(result.score, 100);
        assert!(result.risks.is_empty());
        assert_eq!(result.contract_summary, "...");
    }

    #[test]
    fn summary_length_follows_config() {
        let config = EngineConfig {
            summary_chars: 5,
            ..EngineConfig::default()
        };
        let result = RiskEngine::rules_only(config).analyze("abcdefghij", "");
        assert_eq!(result.contract_summary, "abcde...");
    }

    #[tokio::test]
    async fn concurrent_matches_sequential() {
        let engine = ip_engine();
        let text = "Contractor shall have unlimited liability. Payment within 90 days.";
        let sequential = engine.analyze(text, "");
        let concurrent = engine.analyze_concurrent(text, "").await;
        assert_eq!(sequential, concurrent);
        assert_eq!(concurrent.score, 100 - 20 - 40 - 15);
    }

    #[tokio::test]
    async fn shared_engine_across_tasks() {
        let engine = ip_engine();
        let mut handles = Vec::new();
        for i in 0..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                let text = format!("Contract {i}: payment within 90 days.");
                engine.analyze_concurrent(&text, "").await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.score, 100 - 20 - 15);
        }
    }
}
