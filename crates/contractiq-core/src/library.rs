//! Curated library of risky-phrase exemplars, keyed by category.
//!
//! The library is static configuration: built (or loaded from JSON) once at
//! start-up, validated, and read-only afterwards. A malformed library is a
//! start-up error, never a per-request one.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use thiserror::Error;

use crate::finding::Category;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("exemplar library is empty")]
    Empty,

    #[error("category {0} has no exemplar phrases")]
    EmptyCategory(Category),

    #[error("category {0} contains a blank exemplar phrase")]
    BlankPhrase(Category),

    #[error("category {0} is listed more than once")]
    DuplicateCategory(Category),

    #[error("unknown risk category: {0:?}")]
    UnknownCategory(String),

    #[error("exemplar library file not found: {0}")]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Category → ordered exemplar phrases.
#[derive(Debug, Clone, PartialEq)]
pub struct ExemplarLibrary {
    entries: Vec<(Category, Vec<String>)>,
}

/// Summary statistics for an [`ExemplarLibrary`].
pub struct LibrarySummary {
    pub categories: usize,
    pub phrases: usize,
}

impl ExemplarLibrary {
    /// Build a library, rejecting empty categories, blank phrases and
    /// repeated categories. Entry order is preserved.
    pub fn new(entries: Vec<(Category, Vec<String>)>) -> Result<Self, LibraryError> {
        if entries.is_empty() {
            return Err(LibraryError::Empty);
        }

        let mut seen = HashSet::new();
        for (category, phrases) in &entries {
            if !seen.insert(*category) {
                return Err(LibraryError::DuplicateCategory(*category));
            }
            if phrases.is_empty() {
                return Err(LibraryError::EmptyCategory(*category));
            }
            if phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(LibraryError::BlankPhrase(*category));
            }
        }

        Ok(Self { entries })
    }

    /// Parse `{"Termination": ["..."], "Liability": [...]}`.
    ///
    /// Categories are ordered canonically regardless of key order in the file.
    /// A category key repeated in the file is rejected.
    pub fn from_json_str(json: &str) -> Result<Self, LibraryError> {
        let RawEntries(raw) = serde_json::from_str(json)?;

        let mut entries = Vec::with_capacity(raw.len());
        for (name, phrases) in raw {
            entries.push((name.parse::<Category>()?, phrases));
        }
        entries.sort_by_key(|(category, _)| *category);

        Self::new(entries)
    }

    /// Load a library from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, LibraryError> {
        if !path.exists() {
            return Err(LibraryError::NotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        let library = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            categories = library.entries.len(),
            "loaded exemplar library"
        );
        Ok(library)
    }

    /// Iterate `(category, phrases)` in library order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.entries.iter().map(|(c, p)| (*c, p.as_slice()))
    }

    pub fn summary(&self) -> LibrarySummary {
        LibrarySummary {
            categories: self.entries.len(),
            phrases: self.entries.iter().map(|(_, p)| p.len()).sum(),
        }
    }
}

/// Top-level JSON object read key by key, so repeated keys survive parsing.
struct RawEntries(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RawEntriesVisitor)
    }
}

struct RawEntriesVisitor;

impl<'de> Visitor<'de> for RawEntriesVisitor {
    type Value = RawEntries;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping category names to phrase lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(entry) = map.next_entry::<String, Vec<String>>()? {
            entries.push(entry);
        }
        Ok(RawEntries(entries))
    }
}

impl Default for ExemplarLibrary {
    /// The built-in exemplar set.
    fn default() -> Self {
        let entries = DEFAULT_EXEMPLARS
            .iter()
            .map(|(category, phrases)| {
                (*category, phrases.iter().map(|p| p.to_string()).collect())
            })
            .collect();
        Self { entries }
    }
}

const DEFAULT_EXEMPLARS: &[(Category, &[&str])] = &[
    (
        Category::Termination,
        &[
            "terminate at any time without notice",
            "immediate cancellation by client",
            "termination for convenience",
            "no cure period for breaches",
        ],
    ),
    (
        Category::Liability,
        &[
            "unlimited liability for contractor",
            "indemnify client for all losses",
            "waive all rights to sue",
            "contractor bears all risk",
        ],
    ),
    (
        Category::PaymentTerms,
        &[
            "payment within 90 days",
            "client may withhold payment for any reason",
            "non-negotiable fees",
            "late payment penalties for contractor only",
        ],
    ),
    (
        Category::IntellectualProperty,
        &[
            "client owns all preexisting work",
            "contractor waives all moral rights",
            "assignment of all past and future inventions",
            "perpetual exclusive license to all tools",
        ],
    ),
];
