use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::navigate::RetryPolicy;
use crate::paginate::PaginateOptions;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaginationConfig {
    /// Character budget per virtual page of unstructured text.
    #[serde(default = "default_chunk_chars")]
    pub target_chunk_chars: usize,
    /// Word budget per page of block-structured content.
    #[serde(default = "default_chunk_words")]
    pub target_chunk_words: usize,
    /// Inputs shorter than this get a single placeholder page.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            target_chunk_chars: default_chunk_chars(),
            target_chunk_words: default_chunk_words(),
            min_content_chars: default_min_content_chars(),
        }
    }
}

fn default_chunk_chars() -> usize {
    2000
}
fn default_chunk_words() -> usize {
    550
}
fn default_min_content_chars() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    /// Attempts to locate a scroll anchor before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_scroll_attempts: u32,
    /// Base retry delay in milliseconds; attempt N waits N times this.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    /// How long a navigated-to page stays highlighted.
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            max_scroll_attempts: default_max_attempts(),
            retry_base_ms: default_retry_base_ms(),
            highlight_ms: default_highlight_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}
fn default_retry_base_ms() -> u64 {
    500
}
fn default_highlight_ms() -> u64 {
    3000
}

impl PaginationConfig {
    pub fn options(&self) -> PaginateOptions {
        PaginateOptions {
            target_chunk_chars: self.target_chunk_chars,
            target_chunk_words: self.target_chunk_words,
            min_content_chars: self.min_content_chars,
        }
    }
}

impl ViewerConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_scroll_attempts,
            base_delay: Duration::from_millis(self.retry_base_ms),
        }
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.pagination.target_chunk_chars == 0 {
        anyhow::bail!("pagination.target_chunk_chars must be > 0");
    }
    if config.pagination.target_chunk_words == 0 {
        anyhow::bail!("pagination.target_chunk_words must be > 0");
    }
    if config.viewer.max_scroll_attempts == 0 {
        anyhow::bail!("viewer.max_scroll_attempts must be >= 1");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pagination.target_chunk_chars, 2000);
        assert_eq!(config.pagination.target_chunk_words, 550);
        assert_eq!(config.viewer.max_scroll_attempts, 5);
        assert_eq!(config.viewer.highlight_ms, 3000);
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let config: Config = toml::from_str(
            r#"
[pagination]
target_chunk_chars = 1200

[viewer]
retry_base_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(config.pagination.target_chunk_chars, 1200);
        assert_eq!(config.pagination.min_content_chars, 10);
        assert_eq!(config.viewer.retry_base_ms, 250);
        assert_eq!(config.viewer.max_scroll_attempts, 5);
    }

    #[test]
    fn zero_budgets_are_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagemark.toml");
        std::fs::write(&path, "[pagination]\ntarget_chunk_chars = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
