//! Deterministic keyword rules.
//!
//! Every predicate is evaluated independently; all matching rules fire.

use crate::finding::{Category, ExpectationCheck, RiskFinding, Severity};

/// A fired rule: the finding plus the score penalty it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub finding: RiskFinding,
    pub penalty: i32,
}

/// Evaluate all keyword rules.
///
/// Both inputs are lower-cased here, so callers may pass raw text.
pub fn detect(contract_text: &str, user_expectations: &str) -> Vec<RuleHit> {
    let text = contract_text.to_lowercase();
    let expectations = user_expectations.to_lowercase();

    let mut hits = Vec::new();

    if text.contains("90 days") {
        let check = if expectations.contains("net 15") || expectations.contains("net 30") {
            ExpectationCheck::Mismatch
        } else {
            ExpectationCheck::Concern
        };
        hits.push(RuleHit {
            finding: RiskFinding::rule(
                Category::PaymentTerms,
                Severity::High,
                "Payment terms are Net 90, which is very long.",
                check,
            ),
            penalty: 20,
        });
    }

    if text.contains("immediately") && text.contains("without notice") {
        hits.push(RuleHit {
            finding: RiskFinding::rule(
                Category::Termination,
                Severity::Critical,
                "Client can terminate immediately without cause. You are not protected.",
                ExpectationCheck::Mismatch,
            ),
            penalty: 30,
        });
    }

    if text.contains("unlimited") {
        hits.push(RuleHit {
            finding: RiskFinding::rule(
                Category::Liability,
                Severity::Severe,
                "Your liability is unlimited. This is a major financial risk.",
                ExpectationCheck::Mismatch,
            ),
            penalty: 40,
        });
    }

    hits
}
