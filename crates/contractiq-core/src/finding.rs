//! Risk findings and analysis results shared by the detectors, the scorer
//! and downstream consumers (narrative generation, reports).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::library::LibraryError;

/// Closed set of contract risk categories.
///
/// Declaration order is the canonical library order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Termination,
    Liability,
    #[serde(rename = "Payment Terms")]
    PaymentTerms,
    #[serde(rename = "Intellectual Property")]
    IntellectualProperty,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::Termination,
        Self::Liability,
        Self::PaymentTerms,
        Self::IntellectualProperty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Termination => "Termination",
            Self::Liability => "Liability",
            Self::PaymentTerms => "Payment Terms",
            Self::IntellectualProperty => "Intellectual Property",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| LibraryError::UnknownCategory(s.to_string()))
    }
}

/// Finding severity. Ordered by [`Severity::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
    Severe,
    Critical,
}

impl Severity {
    /// Sort rank: Critical=4, Severe=3, High=2, Medium=1.
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 4,
            Self::Severe => 3,
            Self::High => 2,
            Self::Medium => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Severe => "Severe",
            Self::Critical => "Critical",
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detector produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Rule,
    Semantic,
}

/// How a finding relates to what the user said they expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectationCheck {
    /// The user's stated expectation is contradicted.
    Mismatch,
    /// Generally concerning, no direct contradiction.
    Concern,
    /// Surfaced by semantic analysis only.
    #[serde(rename = "AI Flagged")]
    AIFlagged,
    None,
}

impl ExpectationCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mismatch => "Mismatch",
            Self::Concern => "Concern",
            Self::AIFlagged => "AI Flagged",
            Self::None => "None",
        }
    }
}

/// A single flagged risk. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    category: Category,
    severity: Severity,
    finding: String,
    source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
    expectation_check: ExpectationCheck,
}

impl RiskFinding {
    /// A finding produced by a keyword rule.
    pub fn rule(
        category: Category,
        severity: Severity,
        finding: impl Into<String>,
        expectation_check: ExpectationCheck,
    ) -> Self {
        Self {
            category,
            severity,
            finding: finding.into(),
            source: Source::Rule,
            confidence: None,
            expectation_check,
        }
    }

    /// A finding produced by similarity matching. `confidence` is clamped to [0, 1].
    pub fn semantic(
        category: Category,
        severity: Severity,
        finding: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            category,
            severity,
            finding: finding.into(),
            source: Source::Semantic,
            confidence: Some(confidence.clamp(0.0, 1.0)),
            expectation_check: ExpectationCheck::None,
        }
    }

    /// Copy of this finding carrying a different expectation check.
    pub fn with_expectation_check(self, expectation_check: ExpectationCheck) -> Self {
        Self {
            expectation_check,
            ..self
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn finding(&self) -> &str {
        &self.finding
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    pub fn expectation_check(&self) -> ExpectationCheck {
        self.expectation_check
    }
}

/// Output of one analysis call.
///
/// This is the input contract of the downstream narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Composite score in `[5, 100]`; higher is safer.
    pub score: i32,
    /// Accepted findings, highest severity first.
    pub risks: Vec<RiskFinding>,
    /// Leading excerpt of the contract, always suffixed with `...`.
    pub contract_summary: String,
}
