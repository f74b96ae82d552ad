//! Synonym table used to widen full-text searches.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Maps a search term to alternate terms that also count as a match.
///
/// Loaded from a YAML (or JSON) mapping document:
///
/// ```yaml
/// cat: [feline, kitty]
/// car: [automobile]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SynonymTable(HashMap<String, Vec<String>>);

impl SynonymTable {
    pub fn from_yaml_str(doc: &str) -> Result<Self> {
        if doc.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(doc)
            .context("Synonyms: document must map each term to a list of strings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let doc = std::fs::read_to_string(path)
            .with_context(|| format!("Synonyms: failed to read {}", path.display()))?;
        let table = Self::from_yaml_str(&doc)
            .with_context(|| format!("Synonyms: failed to load {}", path.display()))?;
        tracing::info!("Loaded {} synonym entries from {:?}", table.len(), path);
        Ok(table)
    }

    /// Load from `path` if one is given and the file exists; otherwise an empty table.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::debug!("Synonyms: {:?} does not exist, using an empty table", path);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Alternate terms for `term`, matched exactly.
    pub fn lookup(&self, term: &str) -> &[String] {
        self.0.get(term).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn insert(&mut self, term: impl Into<String>, alternates: Vec<String>) {
        self.0.insert(term.into(), alternates);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for SynonymTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
