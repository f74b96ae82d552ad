//! Filter engine: parses filters and checks inputs against them.

use anyhow::Result;
use std::path::Path;

use crate::dsl::{AstNode, Subject, evaluate_filter, parse_filter};
use crate::synonyms::SynonymTable;

/// Parses filter strings and evaluates them with a fixed synonym table.
///
/// An engine holds no per-parse state, so it can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    synonyms: SynonymTable,
}

impl Engine {
    /// Build an engine, loading synonyms from `synonyms` if given.
    ///
    /// A missing, unreadable or malformed synonym file leaves the table empty.
    pub fn new(synonyms: Option<&Path>) -> Self {
        let table = SynonymTable::load_optional(synonyms).unwrap_or_else(|err| {
            tracing::warn!("{:#}; continuing without synonyms", err);
            SynonymTable::default()
        });
        Self::with_synonyms(table)
    }

    /// Like [`Engine::new`], but an unreadable or malformed synonym file is an error.
    /// A path that does not exist still gives an empty table.
    pub fn try_new(synonyms: Option<&Path>) -> Result<Self> {
        Ok(Self::with_synonyms(SynonymTable::load_optional(synonyms)?))
    }

    pub fn with_synonyms(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn parse(&self, filter: &str) -> AstNode {
        parse_filter(filter)
    }

    pub fn check<'a>(&self, input: impl Into<Subject<'a>>, tree: &AstNode) -> bool {
        evaluate_filter(tree, input.into(), &self.synonyms)
    }
}
