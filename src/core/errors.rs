// src/core/errors.rs

//! The central error type for the chat core and its surrounding services.

use std::sync::Arc;
use thiserror::Error;

/// All failure modes the chat core can produce.
///
/// Client-visible failures (`UnknownUser`, `DuplicateUsername`, `AuthFailed`,
/// `TextTooLong`, `UnknownMessage`, `NotLeader`) are expected to be mapped to
/// an RPC response's `success = false` field rather than propagated as a
/// transport-level error. `PeerUnreachable` never reaches a client; it is
/// retried or logged internally. `CorruptSnapshot` is fatal at startup.
#[derive(Debug, Error, Clone)]
pub enum ChatError {
    #[error("unknown user")]
    UnknownUser,

    #[error("unknown message")]
    UnknownMessage,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("authentication failed")]
    AuthFailed,

    #[error("message text exceeds the 280 code point limit")]
    TextTooLong,

    #[error("this replica is not the leader; leader is at {leader_address:?}")]
    NotLeader { leader_address: Option<String> },

    #[error("peer unreachable: {0}")]
    PeerUnreachable(String),

    #[error("snapshot file is corrupt: {0}")]
    CorruptSnapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PartialEq for ChatError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotLeader { leader_address: a }, Self::NotLeader { leader_address: b }) => {
                a == b
            }
            (Self::PeerUnreachable(a), Self::PeerUnreachable(b)) => a == b,
            (Self::CorruptSnapshot(a), Self::CorruptSnapshot(b)) => a == b,
            (Self::Config(a), Self::Config(b)) => a == b,
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(e: std::io::Error) -> Self {
        ChatError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::CorruptSnapshot(e.to_string())
    }
}
