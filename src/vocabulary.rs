use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ExtractError;

/// Exact-match substitution table from footnote-legend abbreviation to its
/// expansion. Keys match whole trimmed cells only, case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    entries: BTreeMap<String, String>,
}

impl Vocabulary {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Coverage-segment legend printed at the foot of the Rol de
    /// Procedimentos annexes.
    #[must_use]
    pub fn ans_coverage_legend() -> Self {
        Self::from_pairs([
            ("OD", "Seg. Odontológica"),
            ("AMB", "Seg. Ambulatorial"),
        ])
    }

    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(abbreviation, expansion)| (abbreviation.into(), expansion.into()))
                .collect(),
        }
    }

    /// Load a vocabulary from a JSON object file mapping abbreviation to
    /// expansion.
    pub fn from_json_file(path: &Path) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path).map_err(|error| {
            ExtractError::InvalidOption(format!(
                "cannot read vocabulary file '{}': {error}",
                path.display()
            ))
        })?;
        let entries: BTreeMap<String, String> =
            serde_json::from_slice(&bytes).map_err(|error| {
                ExtractError::InvalidOption(format!(
                    "invalid vocabulary file '{}': {error}",
                    path.display()
                ))
            })?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn expand(&self, trimmed_cell: &str) -> Option<&str> {
        self.entries.get(trimmed_cell).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
