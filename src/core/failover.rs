// src/core/failover.rs

//! Failure detection and leader election.
//!
//! Two independent periodic loops run on every replica: one watches the
//! leader from a follower's perspective, one watches followers from the
//! leader's perspective. There is no quorum vote and no epoch/term
//! negotiation — on leader loss, every surviving replica independently
//! computes the same deterministic outcome (the lexicographically smallest
//! surviving address) and converges without needing to talk to each other
//! about the decision itself.

use crate::core::replication;
use crate::core::state::ServerState;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::interval;
use tracing::{info, warn};

/// Runs on every replica. Pings the believed leader on a fixed interval; if
/// the leader stops answering within `heartbeat_timeout`, runs an election.
pub async fn run_follower_heartbeat_loop(state: Arc<ServerState>) {
    let mut ticker = interval(state.config.heartbeat_interval);
    let mut last_ok = Instant::now();

    loop {
        ticker.tick().await;
        if state.is_leader() {
            // We became leader via election; nothing to watch here until we lose it.
            last_ok = Instant::now();
            continue;
        }
        let Some(leader) = state.current_leader_address().await else {
            run_election(&state).await;
            continue;
        };
        if leader == state.address() {
            continue;
        }

        match ping(&leader, &state).await {
            Ok(()) => last_ok = Instant::now(),
            Err(e) => {
                warn!(leader = %leader, error = %e, "leader heartbeat failed");
                if last_ok.elapsed() >= state.config.heartbeat_timeout {
                    warn!(leader = %leader, "leader presumed down, starting election");
                    run_election(&state).await;
                    last_ok = Instant::now();
                }
            }
        }
    }
}

/// Runs only while this replica believes itself the leader. Pings every
/// follower on a fixed interval and prunes any that miss their timeout from
/// `replica_list`, so fan-out stops wasting time on dead peers.
pub async fn run_leader_heartbeat_loop(state: Arc<ServerState>) {
    let mut ticker = interval(state.config.heartbeat_interval);
    loop {
        ticker.tick().await;
        if !state.is_leader() {
            continue;
        }
        let my_address = state.address();
        let peers: Vec<String> = state
            .replica_list
            .read()
            .await
            .iter()
            .filter(|a| **a != my_address)
            .cloned()
            .collect();

        let mut dead = Vec::new();
        for peer in &peers {
            if ping(peer, &state).await.is_err() {
                dead.push(peer.clone());
            }
        }
        if !dead.is_empty() {
            let mut list = state.replica_list.write().await;
            list.retain(|a| !dead.contains(a));
            warn!(?dead, "pruned unresponsive replicas");
        }
    }
}

async fn ping(address: &str, state: &Arc<ServerState>) -> Result<(), crate::core::errors::ChatError> {
    let client = replication::connect(address).await?;
    let mut ctx = tarpc::context::current();
    ctx.deadline = std::time::Instant::now() + replication::call_deadline();
    client
        .heartbeat(ctx, state.address(), state.is_leader())
        .await
        .map_err(|e| crate::core::errors::ChatError::PeerUnreachable(e.to_string()))?;
    Ok(())
}

/// Determines liveness of every candidate in `replica_list` (other than
/// ourselves, who is trivially alive) and elects the lexicographically
/// smallest address among the survivors. Idempotent: every surviving
/// replica that runs this reaches the same conclusion without coordination.
pub async fn run_election(state: &Arc<ServerState>) {
    let my_address = state.address();
    let candidates = state.replica_list.read().await.clone();

    let mut alive = Vec::with_capacity(candidates.len());
    for addr in &candidates {
        if *addr == my_address {
            alive.push(addr.clone());
            continue;
        }
        if ping(addr, state).await.is_ok() {
            alive.push(addr.clone());
        }
    }
    alive.sort();

    let Some(new_leader) = alive.into_iter().next() else {
        warn!("election found no surviving replicas, including ourselves; refusing to decide");
        return;
    };

    let became_leader = new_leader == my_address;
    state.is_leader.store(became_leader, Ordering::Release);
    *state.leader_address.write().await = Some(new_leader.clone());
    crate::core::metrics::ELECTIONS_TOTAL.inc();
    crate::core::metrics::IS_LEADER.set(if became_leader { 1.0 } else { 0.0 });
    info!(new_leader = %new_leader, became_leader, "election completed");
}
