// src/core/state.rs

//! Assembles the shared state every task (RPC dispatcher, replication
//! fan-out, heartbeat loops) reaches into. Mirrors the
//! initialize-then-hand-out-an-`Arc` shape used elsewhere in this codebase
//! for server-wide state.

use crate::config::{Config, Role};
use crate::core::errors::ChatError;
use crate::core::store::{self, SnapshotPaths};
use crate::core::types::Database;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Server-wide shared state. Held behind an `Arc` and cloned into every
/// background task and RPC handler.
pub struct ServerState {
    pub config: Config,
    pub snapshot_paths: SnapshotPaths,
    /// The single lock guarding the replicated database. Held for the
    /// duration of a mutation, its snapshot save, and the kickoff of its
    /// fan-out, so that every release point satisfies the data model's
    /// invariants and followers observe mutations in the leader's order.
    pub db: Mutex<Database>,
    /// Known replica addresses, including this one. Read-mostly; written
    /// only by the join protocol and by heartbeat-driven pruning.
    pub replica_list: RwLock<Vec<String>>,
    pub is_leader: AtomicBool,
    /// The address of the current leader, as last known by this replica.
    /// `None` only very briefly, during an election.
    pub leader_address: RwLock<Option<String>>,
}

impl ServerState {
    pub fn initialize(config: Config) -> Result<Arc<Self>, ChatError> {
        let snapshot_paths = SnapshotPaths::for_address(&config.data_dir, &config.address());
        let db = store::load(&snapshot_paths)?;
        info!(
            users = db.users.len(),
            messages = db.messages.len(),
            "loaded snapshot"
        );

        let is_leader = config.role == Role::Leader;
        let mut replica_list = config.peers.clone();
        let my_address = config.address();
        if !replica_list.contains(&my_address) {
            replica_list.push(my_address.clone());
        }
        replica_list.sort();

        let leader_address = if is_leader {
            Some(my_address)
        } else {
            config.leader_address.clone()
        };

        crate::core::metrics::IS_LEADER.set(if is_leader { 1.0 } else { 0.0 });
        crate::core::metrics::USER_COUNT.set(db.users.len() as f64);
        crate::core::metrics::MESSAGE_COUNT.set(db.messages.len() as f64);

        Ok(Arc::new(Self {
            config,
            snapshot_paths,
            db: Mutex::new(db),
            replica_list: RwLock::new(replica_list),
            is_leader: AtomicBool::new(is_leader),
            leader_address: RwLock::new(leader_address),
        }))
    }

    pub fn address(&self) -> String {
        self.config.address()
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader.load(Ordering::Acquire)
    }

    pub async fn current_leader_address(&self) -> Option<String> {
        self.leader_address.read().await.clone()
    }

    /// Persists the current database to this replica's own snapshot files.
    /// Failures are logged by `store::save` and returned to the caller,
    /// which is expected to keep serving from memory regardless.
    pub fn save_locked(&self, db: &Database) -> Result<(), ChatError> {
        store::save(&self.snapshot_paths, db)
    }
}
