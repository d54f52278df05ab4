// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: command-line flags over an optional TOML file
//!
//! `teller.toml` in the data directory supplies defaults; flags override
//! file values; built-in defaults fill the rest.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "teller.toml";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_LOG_FILTER: &str = "info";

/// Optional values read from `teller.toml`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    listen_addr: Option<String>,
    port: Option<u16>,
    log_filter: Option<String>,
}

/// Resolved daemon configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub listen_addr: String,
    pub port: u16,
    pub log_filter: String,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
}

impl Config {
    /// Resolve configuration for a data directory, with flag overrides
    pub fn load(
        data_dir: PathBuf,
        listen_addr: Option<String>,
        port: Option<u16>,
        log_filter: Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = read_file(&data_dir.join(CONFIG_FILE))?;
        Ok(Self {
            listen_addr: listen_addr
                .or(file.listen_addr)
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            log_filter: log_filter
                .or(file.log_filter)
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            data_dir,
        })
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(e) => return Err(ConfigError::Read(path.to_path_buf(), e)),
    };
    toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
