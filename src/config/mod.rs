use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime settings for the command line front end.
///
/// Read from an optional config file (YAML, JSON or TOML, by extension), then from
/// `SIFT_*` environment variables, e.g. `SIFT_SYNONYMS=synonyms.yml`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Synonym table file.
    #[serde(default)]
    pub synonyms: Option<PathBuf>,
    /// Evaluate record batches on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            synonyms: None,
            parallel: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix("SIFT"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
