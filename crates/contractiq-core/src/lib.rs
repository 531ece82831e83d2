//! Hybrid contract risk detection: keyword rules, semantic similarity and
//! severity-ranked scoring.

pub mod detector;
pub mod engine;
pub mod finding;
pub mod library;
pub mod rules;
pub mod scoring;

pub use detector::{EngineConfig, NoopDetector, SemanticDetector};
pub use engine::RiskEngine;
pub use finding::{AnalysisResult, Category, ExpectationCheck, RiskFinding, Severity, Source};
pub use library::{ExemplarLibrary, LibraryError};
