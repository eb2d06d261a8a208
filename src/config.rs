// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration for autons
//!
//! Optional user preferences are read from ~/.autons/config.json. The file is
//! never written; command-line options and environment variables take
//! precedence over it.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;

/// Program invoked when nothing else is configured
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Per-call bound on Kubernetes API requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Get the base autons directory (~/.autons/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".autons"))
        .context("Could not determine home directory")
}

/// autons configuration file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// kubectl executable to delegate to
    #[serde(default)]
    pub kubectl: Option<String>,

    /// Timeout in seconds for each Kubernetes API call
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config file path (~/.autons/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }
}

/// Effective settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub kubectl: String,
    pub request_timeout: Duration,
}

impl Settings {
    /// Layer command-line and environment values (already merged by clap) over the file
    pub fn resolve(args: &Args, config: Config) -> Result<Self> {
        let kubectl = args
            .kubectl
            .clone()
            .or(config.kubectl)
            .unwrap_or_else(|| DEFAULT_KUBECTL.to_string());

        let request_timeout = match args.timeout.or(config.request_timeout_secs) {
            Some(0) => bail!("Request timeout must be at least one second"),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            kubectl,
            request_timeout,
        })
    }
}
