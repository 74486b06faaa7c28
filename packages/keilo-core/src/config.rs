//! Database configuration.

use std::path::PathBuf;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Data directory for persistence
    pub data_dir: PathBuf,
    /// Write table files as indented JSON
    pub pretty_json: bool,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            pretty_json: true,
            persistence_max_retries: 3,
            persistence_retry_delay_ms: 100,
        }
    }
}
