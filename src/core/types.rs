// src/core/types.rs

//! The data model: `User`, `Message`, and the in-memory `Database` they live in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub uid: String,
    pub username: String,
    pub password_digest: String,
    pub sent_mids: Vec<String>,
    pub received_mids: Vec<String>,
    pub active: bool,
}

impl User {
    pub fn new(uid: String, username: String, password_digest: String) -> Self {
        Self {
            uid,
            username,
            password_digest,
            sent_mids: Vec::new(),
            received_mids: Vec::new(),
            active: true,
        }
    }
}

/// The maximum number of Unicode code points a message's text may contain.
pub const MAX_MESSAGE_TEXT_CODE_POINTS: usize = 280;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub mid: String,
    pub sender_uid: String,
    pub receiver_uid: String,
    pub sender_username: String,
    pub receiver_username: String,
    pub text: String,
    /// Opaque, client-supplied. Compared lexicographically only; never parsed.
    pub timestamp: String,
    pub receiver_read: bool,
}

pub type UserMap = HashMap<String, User>;
pub type MessageMap = HashMap<String, Message>;

/// The full replicated state: every user keyed by uid, every message keyed by mid.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Database {
    pub users: UserMap,
    pub messages: MessageMap,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    pub fn find_user_by_username_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users.values_mut().find(|u| u.username == username)
    }

    /// Like [`Self::find_user_by_username`], but ignores deactivated accounts.
    /// A deactivated username is free to be claimed again and is invisible to
    /// login and message delivery.
    pub fn find_active_user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.active && u.username == username)
    }
}
