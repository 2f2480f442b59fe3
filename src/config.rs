use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::event_log::{Clock, DEFAULT_NAME_KEY, DEFAULT_TIMESTAMP_KEY, DEFAULT_TRACEID_KEY};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PlayoutConfig {
    #[serde(default = "default_no_traces")]
    pub no_traces: usize,
    #[serde(default = "default_max_trace_length")]
    pub max_trace_length: usize,
    #[serde(default = "default_max_silent_steps")]
    pub max_silent_steps: usize,
    #[serde(default = "default_case_id_key")]
    pub case_id_key: String,
    #[serde(default = "default_activity_key")]
    pub activity_key: String,
    #[serde(default = "default_timestamp_key")]
    pub timestamp_key: String,
    /// Seconds since the epoch of the first emitted event.
    #[serde(default = "default_start_timestamp")]
    pub start_timestamp: u64,
    /// Drawn from the thread RNG (and logged) when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub parallel: bool,
}

impl Default for PlayoutConfig {
    fn default() -> Self {
        Self {
            no_traces: default_no_traces(),
            max_trace_length: default_max_trace_length(),
            max_silent_steps: default_max_silent_steps(),
            case_id_key: default_case_id_key(),
            activity_key: default_activity_key(),
            timestamp_key: default_timestamp_key(),
            start_timestamp: default_start_timestamp(),
            seed: None,
            parallel: false,
        }
    }
}

impl PlayoutConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: PlayoutConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_traces(mut self, no_traces: usize, max_trace_length: usize) -> Self {
        self.no_traces = no_traces;
        self.max_trace_length = max_trace_length;
        self
    }
}

fn default_no_traces() -> usize {
    1000
}

fn default_max_trace_length() -> usize {
    1000
}

fn default_max_silent_steps() -> usize {
    10_000
}

fn default_case_id_key() -> String {
    DEFAULT_TRACEID_KEY.to_string()
}

fn default_activity_key() -> String {
    DEFAULT_NAME_KEY.to_string()
}

fn default_timestamp_key() -> String {
    DEFAULT_TIMESTAMP_KEY.to_string()
}

fn default_start_timestamp() -> u64 {
    Clock::DEFAULT_EPOCH_OFFSET
}
