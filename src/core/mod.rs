// src/core/mod.rs

pub mod auth;
pub mod chat;
pub mod errors;
pub mod failover;
pub mod ids;
pub mod metrics;
pub mod replication;
pub mod state;
pub mod store;
pub mod types;

pub use errors::ChatError;
pub use state::ServerState;
pub use types::{Database, Message, User};
