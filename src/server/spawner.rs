// src/server/spawner.rs

//! Spawns the long-running background tasks every replica needs regardless
//! of role: the two heartbeat loops and, if enabled, the metrics endpoint.

use crate::config::Config;
use crate::core::failover;
use crate::core::state::ServerState;
use crate::server::metrics_server;
use std::sync::Arc;
use tokio::task::JoinSet;

pub fn spawn_all(state: Arc<ServerState>, config: &Config) -> JoinSet<()> {
    let mut tasks = JoinSet::new();

    tasks.spawn(failover::run_follower_heartbeat_loop(state.clone()));
    tasks.spawn(failover::run_leader_heartbeat_loop(state.clone()));

    if config.metrics_enabled {
        let metrics_port = config.metrics_port;
        let host = config.host.clone();
        tasks.spawn(async move {
            if let Err(e) = metrics_server::run(host, metrics_port).await {
                tracing::error!(error = %e, "metrics server exited");
            }
        });
    }

    tasks
}
