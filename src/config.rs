// src/config.rs
//! Runtime configuration, loadable from TOML.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReceptionistConfig {
    /// Capacity of the receptionist's command queue. `None` means unbounded.
    pub mailbox_capacity: Option<usize>,
    /// How long [`crate::Receptionist::ask_find`] waits for a listing.
    pub ask_timeout_ms: u64,
}

impl Default for ReceptionistConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: None,
            ask_timeout_ms: 3_000,
        }
    }
}

impl ReceptionistConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        Self::from_toml_str(&config_str)
    }

    pub fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.ask_timeout_ms)
    }
}
