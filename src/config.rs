//! Runtime configuration for the core, layered over built-in defaults using
//! the `config` crate.
//!
//! BM25 `k1`/`b` are intentionally not configurable here: they are
//! process-wide, immutable, frozen parameters of the index itself, not
//! per-job configuration.

use crate::analyzer::InferenceConfig;
use crate::chunking::ChunkingConfig;
use crate::orchestrator::CoreConfig;
use serde::Deserialize;
use std::time::Duration;

/// On-disk/env-overridable settings. Field names match the `[core]` table a
/// collaborator would place in a config file or `CC_` prefixed environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pages_per_chunk: usize,
    pub overlap_pages: usize,
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub llm_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pages_per_chunk: 1,
            overlap_pages: 0,
            max_retries: 3,
            initial_backoff_ms: 500,
            llm_timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Loads settings layered as: built-in defaults, then an optional
    /// `~/.config/contract-compliance/config.toml` (resolved via the `dirs`
    /// crate, lowest precedence override), then a repo-local
    /// `config/default.{toml,yaml,json}`, then `CC_*` environment variables,
    /// highest precedence last.
    #[cfg(feature = "cli")]
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();

        let mut builder = config::Config::builder()
            .set_default("pages_per_chunk", defaults.pages_per_chunk as i64)?
            .set_default("overlap_pages", defaults.overlap_pages as i64)?
            .set_default("max_retries", defaults.max_retries as i64)?
            .set_default("initial_backoff_ms", defaults.initial_backoff_ms as i64)?
            .set_default("llm_timeout_secs", defaults.llm_timeout_secs as i64)?;

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("contract-compliance").join("config");
            builder = builder.add_source(
                config::File::from(user_config).required(false),
            );
        }

        builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("CC"))
            .build()?
            .try_deserialize()
    }

    /// Non-CLI builds skip the user config directory lookup (no `dirs` dep).
    #[cfg(not(feature = "cli"))]
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();

        config::Config::builder()
            .set_default("pages_per_chunk", defaults.pages_per_chunk as i64)?
            .set_default("overlap_pages", defaults.overlap_pages as i64)?
            .set_default("max_retries", defaults.max_retries as i64)?
            .set_default("initial_backoff_ms", defaults.initial_backoff_ms as i64)?
            .set_default("llm_timeout_secs", defaults.llm_timeout_secs as i64)?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("CC"))
            .build()?
            .try_deserialize()
    }

    pub fn to_core_config(&self) -> CoreConfig {
        CoreConfig {
            chunking: ChunkingConfig {
                pages_per_chunk: self.pages_per_chunk,
                overlap_pages: self.overlap_pages,
            },
            inference: InferenceConfig {
                max_retries: self.max_retries,
                initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_default_policy() {
        let settings = Settings::default();
        assert_eq!(settings.pages_per_chunk, 1);
        assert_eq!(settings.overlap_pages, 0);
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn converts_to_core_config() {
        let settings = Settings::default();
        let core = settings.to_core_config();
        assert_eq!(core.chunking.pages_per_chunk, 1);
        assert_eq!(core.inference.max_retries, 3);
    }
}
