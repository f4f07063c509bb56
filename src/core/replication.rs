// src/core/replication.rs

//! The replication engine: connecting to peers, joining a replica set, and
//! fanning the full database out to followers after every leader mutation.
//!
//! Fan-out pushes the *whole* user and message maps on every mutation,
//! rather than an incremental operation log. That is a deliberate trade-off
//! of simplicity over bandwidth, not a shortcut: it means a follower can
//! never apply updates out of order or miss one, at the cost of O(state)
//! traffic per mutation.

use crate::core::errors::ChatError;
use crate::core::state::ServerState;
use crate::core::types::Database;
use crate::rpc::messages::{MessageData, UserData};
use crate::rpc::service::ChatServiceClient;
use std::sync::Arc;
use std::time::Duration;
use tarpc::client;
use tarpc::context;
use tarpc::tokio_serde::formats::Bincode;
use tracing::{debug, warn};

/// How long a single replication RPC (fan-out, heartbeat, join) is allowed
/// to run before it is abandoned. Always well under the heartbeat interval,
/// per the concurrency model's timeout requirement.
pub fn call_deadline() -> Duration {
    Duration::from_millis(1500)
}

pub async fn connect(address: &str) -> Result<ChatServiceClient, ChatError> {
    let socket_addr: std::net::SocketAddr = address
        .parse()
        .map_err(|e| ChatError::PeerUnreachable(format!("bad address {address}: {e}")))?;
    let transport = tarpc::serde_transport::tcp::connect(socket_addr, Bincode::default)
        .await
        .map_err(|e| ChatError::PeerUnreachable(format!("{address}: {e}")))?;
    Ok(ChatServiceClient::new(client::Config::default(), transport).spawn())
}

fn call_context() -> context::Context {
    let mut ctx = context::current();
    ctx.deadline = std::time::Instant::now() + call_deadline();
    ctx
}

/// Pushes the full database to every known replica other than ourselves.
/// Leader-only; called after every committed mutation while still holding
/// the database lock, so followers observe mutations in the leader's order.
pub async fn fanout_to_replicas(state: &Arc<ServerState>, db: &Database) {
    let my_address = state.address();
    let peers: Vec<String> = state
        .replica_list
        .read()
        .await
        .iter()
        .filter(|a| **a != my_address)
        .cloned()
        .collect();

    let users: Vec<UserData> = db.users.values().map(UserData::from).collect();
    let messages: Vec<MessageData> = db.messages.values().map(MessageData::from).collect();

    for peer in peers {
        let users = users.clone();
        let messages = messages.clone();
        match push_snapshot(&peer, users, messages).await {
            Ok(()) => {
                crate::core::metrics::FANOUT_TOTAL.inc();
                debug!(peer = %peer, "fan-out delivered");
            }
            Err(e) => {
                crate::core::metrics::FANOUT_FAILURES_TOTAL.inc();
                warn!(peer = %peer, error = %e, "fan-out to replica failed");
            }
        }
    }
}

/// Pushes a full snapshot to a single peer (used for both the regular
/// fan-out and the one-off catch-up sync sent to a newly joined replica).
pub async fn push_snapshot(
    peer: &str,
    users: Vec<UserData>,
    messages: Vec<MessageData>,
) -> Result<(), ChatError> {
    let client = connect(peer).await?;
    client
        .sync_users_from_leader(call_context(), users)
        .await
        .map_err(|e| ChatError::PeerUnreachable(e.to_string()))?;
    client
        .sync_messages_from_leader(call_context(), messages)
        .await
        .map_err(|e| ChatError::PeerUnreachable(e.to_string()))?;
    Ok(())
}

/// Pushes the current `replica_list` to every member other than `exclude`
/// and ourselves. Called by the leader whenever membership changes, so
/// every follower's view of the group converges to the same set (the
/// precondition deterministic election relies on).
pub async fn push_replica_list(state: &Arc<ServerState>, replica_list: &[String], exclude: &str) {
    let my_address = state.address();
    for peer in replica_list {
        if peer == &my_address || peer == exclude {
            continue;
        }
        let result = async {
            let client = connect(peer).await?;
            client
                .sync_replica_list_from_leader(call_context(), replica_list.to_vec())
                .await
                .map_err(|e| ChatError::PeerUnreachable(e.to_string()))
        }
        .await;
        if let Err(e) = result {
            warn!(peer = %peer, error = %e, "failed to push replica list");
        }
    }
}

/// Joins an existing replica set by registering with a leader (or any known
/// peer, which will redirect), receiving back the canonical replica list and
/// the current leader's address.
pub async fn join(state: &Arc<ServerState>, contact_address: &str) -> Result<(), ChatError> {
    let client = connect(contact_address).await?;
    let resp = client
        .register_replica(call_context(), state.address())
        .await
        .map_err(|e| ChatError::PeerUnreachable(e.to_string()))?;

    if !resp.success {
        return Err(ChatError::PeerUnreachable(format!(
            "{contact_address} rejected registration"
        )));
    }
    *state.replica_list.write().await = resp.replica_list;
    *state.leader_address.write().await = resp.leader_address;
    Ok(())
}
