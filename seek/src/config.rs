//! Engine configuration.
//!
//! Every field has a default so a partial JSON file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest paragraph or query accepted, in bytes
pub const MAX_PARAGRAPH_SIZE: usize = 200;

/// Scheduling priority requested for dispatcher worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPriority {
    /// Leave the OS default untouched
    #[default]
    Normal,
    Min,
    /// Highest priority the OS grants this process; may need privileges
    Max,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Worker threads running exact-match lookups (at least one is always started)
    pub threads: usize,
    pub priority: WorkerPriority,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            priority: WorkerPriority::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_query_len: usize,
    pub max_paragraph_len: usize,
    pub dispatcher: DispatcherConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_query_len: MAX_PARAGRAPH_SIZE,
            max_paragraph_len: MAX_PARAGRAPH_SIZE,
            dispatcher: DispatcherConfig::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_query_len, 200);
        assert_eq!(config.max_paragraph_len, 200);
        assert_eq!(config.dispatcher.threads, 1);
        assert_eq!(config.dispatcher.priority, WorkerPriority::Normal);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = EngineConfig::from_json_str(r#"{"dispatcher": {"priority": "max"}}"#).unwrap();
        assert_eq!(config.dispatcher.priority, WorkerPriority::Max);
        assert_eq!(config.dispatcher.threads, 1);
        assert_eq!(config.max_query_len, 200);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_unknown_priority_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"dispatcher": {"priority": "realtime"}}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seek.json");
        std::fs::write(&path, r#"{"max_query_len": 64, "dispatcher": {"threads": 2}}"#).unwrap();
        let config = EngineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_query_len, 64);
        assert_eq!(config.dispatcher.threads, 2);
    }
}
