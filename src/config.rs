//! TOML configuration parsing.
//!
//! ```toml
//! [catalog]
//! path = "base_de_dados.xlsx"
//! code_column = "Código"
//! on_collision = "overwrite"   # or "fail"
//!
//! [recognition]
//! languages = "por+eng"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog::CollisionPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// XLSX workbook holding the reference catalog.
    pub path: PathBuf,
    #[serde(default = "default_code_column")]
    pub code_column: String,
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

fn default_code_column() -> String {
    "Code".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecognitionConfig {
    /// Language hint handed to the recognition backend, e.g. "eng" or
    /// "por+eng".
    #[serde(default = "default_languages")]
    pub languages: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        RecognitionConfig {
            languages: default_languages(),
        }
    }
}

fn default_languages() -> String {
    "eng".to_string()
}

impl Config {
    /// Load and parse a config file.
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config =
            toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// Config for a catalog at `path` with every other setting defaulted.
    pub fn for_catalog(path: impl Into<PathBuf>) -> Config {
        Config {
            catalog: CatalogConfig {
                path: path.into(),
                code_column: default_code_column(),
                on_collision: CollisionPolicy::default(),
            },
            recognition: RecognitionConfig::default(),
        }
    }
}
