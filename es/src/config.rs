//! Event stream configuration

use std::fs;
use std::path::Path;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::resolve::TEXT_PLAIN;

/// How event payloads are interpreted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EventStreamConfig {
    /// Content type for event types that stay text
    pub default_content_type: String,

    /// Event types whose data is JSON; `*` matches every type
    pub json_events: Vec<String>,
}

impl Default for EventStreamConfig {
    fn default() -> Self {
        Self {
            default_content_type: TEXT_PLAIN.to_string(),
            json_events: Vec::new(),
        }
    }
}

impl EventStreamConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context(format!("Failed to read {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse event stream config")?;

        tracing::info!("Loaded event stream config from: {}", path.as_ref().display());
        Ok(config)
    }
}
