// src/rpc/messages.rs

//! Wire types for the chat RPC surface. Each response carries an explicit
//! `success`/`found` flag rather than relying on the transport's own error
//! channel — failures like "unknown user" or "not the leader" are ordinary,
//! expected outcomes a client must branch on, not exceptional transport
//! errors.

use crate::core::types::{Message, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub uid: String,
    pub username: String,
    pub password_digest: String,
    pub received_mids: Vec<String>,
    pub sent_mids: Vec<String>,
    pub active: bool,
}

impl From<&User> for UserData {
    fn from(u: &User) -> Self {
        Self {
            uid: u.uid.clone(),
            username: u.username.clone(),
            password_digest: u.password_digest.clone(),
            received_mids: u.received_mids.clone(),
            sent_mids: u.sent_mids.clone(),
            active: u.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageData {
    pub mid: String,
    pub sender_uid: String,
    pub receiver_uid: String,
    pub sender_username: String,
    pub receiver_username: String,
    pub text: String,
    pub timestamp: String,
    pub receiver_read: bool,
}

impl From<&Message> for MessageData {
    fn from(m: &Message) -> Self {
        Self {
            mid: m.mid.clone(),
            sender_uid: m.sender_uid.clone(),
            receiver_uid: m.receiver_uid.clone(),
            sender_username: m.sender_username.clone(),
            receiver_username: m.receiver_username.clone(),
            text: m.text.clone(),
            timestamp: m.timestamp.clone(),
            receiver_read: m.receiver_read,
        }
    }
}

impl From<MessageData> for Message {
    fn from(m: MessageData) -> Self {
        Self {
            mid: m.mid,
            sender_uid: m.sender_uid,
            receiver_uid: m.receiver_uid,
            sender_username: m.sender_username,
            receiver_username: m.receiver_username,
            text: m.text,
            timestamp: m.timestamp,
            receiver_read: m.receiver_read,
        }
    }
}

impl From<UserData> for User {
    fn from(u: UserData) -> Self {
        Self {
            uid: u.uid,
            username: u.username,
            password_digest: u.password_digest,
            sent_mids: u.sent_mids,
            received_mids: u.received_mids,
            active: u.active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUsernameResponse {
    pub exists: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPasswordResponse {
    pub success: bool,
    pub uid: Option<String>,
    pub reason: Option<String>,
    pub leader_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAccountsResponse {
    pub usernames: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub reason: Option<String>,
    pub leader_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub mid: Option<String>,
    pub reason: Option<String>,
    pub leader_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMidsResponse {
    pub success: bool,
    pub mids: Vec<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMessageResponse {
    pub found: bool,
    pub message: Option<MessageData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkMessageReadResponse {
    pub success: bool,
    pub reason: Option<String>,
    pub leader_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMessagesResponse {
    pub success: bool,
    pub reason: Option<String>,
    pub leader_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterReplicaResponse {
    pub success: bool,
    pub replica_list: Vec<String>,
    pub leader_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncAckResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub alive: bool,
    pub is_leader: bool,
    pub leader_address: Option<String>,
}
