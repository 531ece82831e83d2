//! Human-readable cards for analysis reports and the exemplar library.
//!
//! Findings are grouped under severity headers, highest first; empty
//! groups are skipped.

use std::io::{self, Write};

use contractiq_core::{AnalysisResult, ExemplarLibrary, RiskFinding, Severity, Source};
use serde::Serialize;

const SEVERITY_SECTIONS: &[Severity] = &[
    Severity::Critical,
    Severity::Severe,
    Severity::High,
    Severity::Medium,
];

/// One analyzed contract, as printed or serialized by the CLI.
#[derive(Debug, Serialize)]
pub struct Report {
    pub source: String,
    /// RFC 3339 timestamp.
    pub analyzed_at: String,
    pub backend: String,
    pub analysis: AnalysisResult,
}

pub fn write_card(out: &mut impl Write, report: &Report) -> io::Result<()> {
    let analysis = &report.analysis;

    writeln!(out, "=== {} ===", report.source)?;
    writeln!(out, "  {:<12} {}/100", "score", analysis.score)?;
    writeln!(out, "  {:<12} {}", "semantic", report.backend)?;
    writeln!(out, "  {:<12} {}", "summary", one_line(&analysis.contract_summary))?;
    writeln!(out)?;

    if analysis.risks.is_empty() {
        return writeln!(out, "No risks found.");
    }

    for &severity in SEVERITY_SECTIONS {
        let group: Vec<&RiskFinding> = analysis
            .risks
            .iter()
            .filter(|r| r.severity() == severity)
            .collect();
        if group.is_empty() {
            continue;
        }

        writeln!(out, "{severity}")?;
        for risk in group {
            writeln!(out, "  {}", finding_line(risk))?;
        }
    }
    Ok(())
}

fn finding_line(risk: &RiskFinding) -> String {
    match (risk.source(), risk.confidence()) {
        (Source::Semantic, Some(confidence)) => format!(
            "[{}] \"{}\" ({}, {:.2})",
            risk.category(),
            risk.finding(),
            risk.expectation_check().as_str(),
            confidence
        ),
        _ => format!(
            "[{}] {} ({})",
            risk.category(),
            risk.finding(),
            risk.expectation_check().as_str()
        ),
    }
}

/// Collapse whitespace runs so multi-line summaries fit one line.
fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn write_library(out: &mut impl Write, library: &ExemplarLibrary) -> io::Result<()> {
    let summary = library.summary();
    writeln!(
        out,
        "{} categories, {} exemplar phrases",
        summary.categories, summary.phrases
    )?;
    for (category, phrases) in library.iter() {
        writeln!(out, "\n{category}")?;
        for phrase in phrases {
            writeln!(out, "  - {phrase}")?;
        }
    }
    Ok(())
}
