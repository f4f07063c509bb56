// src/server/initialization.rs

//! Loads configuration-derived state before the accept loop starts. Joining
//! an existing replica set is handled separately by [`join_if_follower`],
//! which the caller must run only *after* its own listener is already
//! accepting connections — the leader answers `RegisterReplica` by calling
//! straight back into the new follower to push its initial snapshot, so a
//! follower that joins before it can accept that callback would drop it.

use crate::config::{Config, Role};
use crate::core::replication;
use crate::core::state::ServerState;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub fn setup(config: Config) -> Result<Arc<ServerState>> {
    log_startup_info(&config);
    ServerState::initialize(config).map_err(|e| anyhow!("failed to initialize server state: {e}"))
}

pub async fn join_if_follower(state: &Arc<ServerState>, config: &Config) {
    if config.role != Role::Follower {
        return;
    }
    let contact = config.leader_address.clone().or_else(|| {
        config
            .peers
            .iter()
            .find(|p| **p != config.address())
            .cloned()
    });
    let Some(contact) = contact else { return };
    match replication::join(state, &contact).await {
        Ok(()) => info!(contact = %contact, "joined replica set"),
        Err(e) => warn!(
            contact = %contact,
            error = %e,
            "failed to join at startup; will retry via heartbeat/election"
        ),
    }
}

fn log_startup_info(config: &Config) {
    info!(
        host = %config.host,
        port = config.port,
        role = ?config.role,
        data_dir = %config.data_dir.display(),
        "starting chatterd"
    );
}
