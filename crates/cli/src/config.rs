//! Configuration management for the CLI
//!
//! Settings are layered: built-in defaults, then the optional file at
//! `~/.config/atlanta/config.{toml,json,yaml}`, then `ATLANTA_*` environment
//! variables. Command line flags are applied on top by the caller.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tuner_lib::capabilities::{
    DEFAULT_AGENT_NAMESPACE, DEFAULT_CAPABILITIES_PATH, DEFAULT_PIPE_BUFFER_BYTES,
};
use tuner_lib::{FetchSettings, ReservationPolicy};

/// CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TunerConfig {
    /// Namespace the node agent pods run in
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Label selector identifying the node agent pods
    #[serde(default = "default_agent_label_selector")]
    pub agent_label_selector: String,

    /// Container in the agent pod to exec into
    #[serde(default = "default_agent_container")]
    pub agent_container: String,

    /// Path of the capability document inside the agent container
    #[serde(default = "default_capabilities_path")]
    pub capabilities_path: String,

    /// Capacity of the in-process pipe between exec and parser
    #[serde(default = "default_pipe_buffer_bytes")]
    pub pipe_buffer_bytes: usize,

    /// Deadline for reading the capability document, unbounded if unset
    #[serde(default)]
    pub exec_timeout_secs: Option<u64>,

    /// NUMA cell whose CPUs are reserved for the system
    #[serde(default)]
    pub reserved_cell: ReservationPolicy,
}

fn default_namespace() -> String {
    DEFAULT_AGENT_NAMESPACE.to_string()
}

fn default_agent_label_selector() -> String {
    tuner_lib::capabilities::DEFAULT_AGENT_LABEL_SELECTOR.to_string()
}

fn default_agent_container() -> String {
    tuner_lib::capabilities::DEFAULT_AGENT_CONTAINER.to_string()
}

fn default_capabilities_path() -> String {
    DEFAULT_CAPABILITIES_PATH.to_string()
}

fn default_pipe_buffer_bytes() -> usize {
    DEFAULT_PIPE_BUFFER_BYTES
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            agent_label_selector: default_agent_label_selector(),
            agent_container: default_agent_container(),
            capabilities_path: default_capabilities_path(),
            pipe_buffer_bytes: default_pipe_buffer_bytes(),
            exec_timeout_secs: None,
            reserved_cell: ReservationPolicy::default(),
        }
    }
}

impl TunerConfig {
    /// Load configuration from the user config file and environment
    pub fn load() -> Result<Self> {
        let path = Self::config_path().ok();
        Self::load_from(path.as_deref())
    }

    /// Load configuration using `path` (without extension) as the file stem
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::with_name(&path.to_string_lossy()).required(false),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix("ATLANTA").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Settings handed to the capability fetcher
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            namespace: self.namespace.clone(),
            capabilities_path: self.capabilities_path.clone(),
            pipe_buffer_bytes: self.pipe_buffer_bytes,
        }
    }

    pub fn exec_timeout(&self) -> Option<Duration> {
        self.exec_timeout_secs.map(Duration::from_secs)
    }

    /// Get the configuration file stem
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("atlanta").join("config"))
    }
}
