//! `codecctl` configuration file.
//!
//! ```toml
//! [registry]
//! on_conflict = "keep_first"
//! max_delegation_depth = 16
//!
//! [markup]
//! max_depth = 64
//!
//! [logging]
//! filter = "coding=debug,info"
//! format = "json"
//! ```
//!
//! Every table and field is optional.

use std::path::Path;

use anyhow::Context;
use coding::RegistryConfig;
use serde::Deserialize;

/// Log line formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// The `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_owned(),
            format: LogFormat::default(),
        }
    }
}

/// The `[markup]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkupConfig {
    /// Deepest element nesting accepted from input documents.
    pub max_depth: usize,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            max_depth: markup::DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub registry: RegistryConfig,
    pub markup: MarkupConfig,
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Reads `path`, or returns the defaults when no file exists there.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
