// src/config.rs

//! TOML-backed server configuration, following the same
//! raw-struct-with-defaults-then-validate shape used throughout this
//! codebase's configuration loading.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    9090
}
fn default_data_dir() -> String {
    "./data".to_string()
}
fn default_heartbeat_interval_ms() -> u64 {
    500
}
fn default_heartbeat_timeout_ms() -> u64 {
    2000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9898
}

/// The role a replica starts as. A replica started as `Follower` still
/// participates in election once its leader becomes unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

impl Default for Role {
    fn default() -> Self {
        Role::Follower
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    role: Role,
    /// Address of the leader to join at startup. Required when `role` is
    /// `follower` and this replica is not itself replica #0.
    leader_address: Option<String>,
    /// Every known replica address, including this one, for seeding
    /// `replica_list` before the first heartbeat round confirms membership.
    #[serde(default)]
    peers: Vec<String>,
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default = "default_heartbeat_interval_ms")]
    heartbeat_interval_ms: u64,
    #[serde(default = "default_heartbeat_timeout_ms")]
    heartbeat_timeout_ms: u64,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_metrics_enabled")]
    metrics_enabled: bool,
    #[serde(default = "default_metrics_port")]
    metrics_port: u16,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub role: Role,
    pub leader_address: Option<String>,
    pub peers: Vec<String>,
    pub data_dir: PathBuf,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub log_level: String,
    pub metrics_enabled: bool,
    pub metrics_port: u16,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw: RawConfig = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()
            .map_err(|e| anyhow!("failed to read config file '{path}': {e}"))?
            .try_deserialize()
            .map_err(|e| anyhow!("failed to parse config file '{path}': {e}"))?;

        let cfg = Config {
            host: raw.host,
            port: raw.port,
            role: raw.role,
            leader_address: raw.leader_address,
            peers: raw.peers,
            data_dir: PathBuf::from(raw.data_dir),
            heartbeat_interval: Duration::from_millis(raw.heartbeat_interval_ms),
            heartbeat_timeout: Duration::from_millis(raw.heartbeat_timeout_ms),
            log_level: raw.log_level,
            metrics_enabled: raw.metrics_enabled,
            metrics_port: raw.metrics_port,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port must be non-zero"));
        }
        if self.host.is_empty() {
            return Err(anyhow!("host must not be empty"));
        }
        if self.role == Role::Follower && self.leader_address.is_none() && self.peers.len() <= 1 {
            return Err(anyhow!(
                "a follower needs either 'leader_address' or a 'peers' list to discover one"
            ));
        }
        if self.heartbeat_timeout <= self.heartbeat_interval {
            return Err(anyhow!(
                "heartbeat_timeout_ms must be greater than heartbeat_interval_ms"
            ));
        }
        if self.metrics_enabled && self.metrics_port == self.port {
            return Err(anyhow!("metrics_port must differ from the RPC port"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follower_without_leader_or_peers_is_rejected() {
        let cfg = Config {
            host: "127.0.0.1".into(),
            port: 9090,
            role: Role::Follower,
            leader_address: None,
            peers: vec![],
            data_dir: "./data".into(),
            heartbeat_interval: Duration::from_millis(500),
            heartbeat_timeout: Duration::from_millis(2000),
            log_level: "info".into(),
            metrics_enabled: true,
            metrics_port: 9898,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn leader_needs_no_leader_address() {
        let cfg = Config {
            host: "127.0.0.1".into(),
            port: 9090,
            role: Role::Leader,
            leader_address: None,
            peers: vec![],
            data_dir: "./data".into(),
            heartbeat_interval: Duration::from_millis(500),
            heartbeat_timeout: Duration::from_millis(2000),
            log_level: "info".into(),
            metrics_enabled: true,
            metrics_port: 9898,
        };
        assert!(cfg.validate().is_ok());
    }
}
