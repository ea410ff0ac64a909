//! streamduct configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default buffer capacity for channels and active sources
pub const DEFAULT_CAPACITY: usize = 128;

/// Main streamduct configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Plain channel defaults
    pub channel: ChannelConfig,

    /// Active source runner defaults
    pub active: ActiveConfig,
}

impl Config {
    /// Read a YAML config file; missing sections keep their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&content).context(format!("Failed to parse {}", path.display()))?;

        tracing::debug!(path = %path.display(), ?config, "Config::load_from_file: loaded");
        Ok(config)
    }
}

/// Channel defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Buffer capacity; 0 selects rendezvous mode
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Where an active source runs its producer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// A task on the caller's tokio runtime
    #[default]
    Current,

    /// A dedicated OS thread driving its own current-thread runtime
    Thread,
}

/// Active source runner defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveConfig {
    /// Prefetch buffer capacity; 0 makes the producer run in lockstep
    pub capacity: usize,

    /// Execution context for the producer task
    pub executor: ExecutorKind,

    /// Name prefix for dedicated producer threads
    #[serde(rename = "thread-name")]
    pub thread_name: String,
}

impl Default for ActiveConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            executor: ExecutorKind::Current,
            thread_name: "streamduct-producer".to_string(),
        }
    }
}
