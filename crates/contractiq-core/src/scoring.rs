//! Merge rule and semantic findings into a scored, severity-ranked result.

use crate::finding::{AnalysisResult, ExpectationCheck, RiskFinding, Severity};
use crate::rules::RuleHit;

pub const BASE_SCORE: i32 = 100;
pub const MIN_SCORE: i32 = 5;

const HIGH_SEMANTIC_PENALTY: i32 = 15;
const OTHER_SEMANTIC_PENALTY: i32 = 10;

/// Combine detector outputs into an [`AnalysisResult`].
///
/// Semantic findings are checked in order against everything accepted so
/// far (rule findings first, then earlier semantic ones). A finding whose
/// category matches and whose text contains, or is contained in, an
/// accepted finding's text is dropped; the rest are tagged `AI Flagged`.
pub fn aggregate(
    rule_hits: Vec<RuleHit>,
    semantic: Vec<RiskFinding>,
    contract_text: &str,
    summary_chars: usize,
) -> AnalysisResult {
    let mut score = BASE_SCORE;
    let mut risks: Vec<RiskFinding> = Vec::with_capacity(rule_hits.len() + semantic.len());

    for hit in rule_hits {
        score -= hit.penalty;
        risks.push(hit.finding);
    }

    for candidate in semantic {
        if is_duplicate(&risks, &candidate) {
            tracing::debug!(
                category = %candidate.category(),
                "dropping semantic finding that overlaps an accepted one"
            );
            continue;
        }
        score -= semantic_penalty(candidate.severity());
        risks.push(candidate.with_expectation_check(ExpectationCheck::AIFlagged));
    }

    let score = score.clamp(MIN_SCORE, BASE_SCORE);

    // Stable: ties keep acceptance order.
    risks.sort_by(|a, b| b.severity().rank().cmp(&a.severity().rank()));

    AnalysisResult {
        score,
        risks,
        contract_summary: summarize(contract_text, summary_chars),
    }
}

fn is_duplicate(accepted: &[RiskFinding], candidate: &RiskFinding) -> bool {
    accepted.iter().any(|r| {
        r.category() == candidate.category()
            && (r.finding().contains(candidate.finding())
                || candidate.finding().contains(r.finding()))
    })
}

fn semantic_penalty(severity: Severity) -> i32 {
    if severity == Severity::High {
        HIGH_SEMANTIC_PENALTY
    } else {
        OTHER_SEMANTIC_PENALTY
    }
}

/// First `max_chars` characters plus `...`, appended even when nothing was cut.
pub fn summarize(contract_text: &str, max_chars: usize) -> String {
    let mut summary: String = contract_text.chars().take(max_chars).collect();
    summary.push_str("...");
    summary
}
