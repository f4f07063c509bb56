// src/core/chat.rs

//! Pure chat operations over a `Database`. None of these functions perform
//! I/O, replication, or locking; the caller (the RPC dispatcher) is
//! responsible for persisting and fanning out whatever mutation results.

use crate::core::auth;
use crate::core::errors::ChatError;
use crate::core::ids;
use crate::core::types::{Database, Message, User, MAX_MESSAGE_TEXT_CODE_POINTS};
use wildmatch::WildMatch;

pub fn check_username_exists(db: &Database, username: &str) -> bool {
    db.find_active_user_by_username(username).is_some()
}

pub fn verify_password(db: &Database, username: &str, password: &str) -> Result<&User, ChatError> {
    let user = db
        .find_user_by_username(username)
        .ok_or(ChatError::UnknownUser)?;
    if auth::verify_password(password, &user.password_digest) {
        Ok(user)
    } else {
        Err(ChatError::AuthFailed)
    }
}

/// Creates a new account, returning the freshly minted user.
///
/// Callers must have already confirmed via [`check_username_exists`] that the
/// username is free; this function itself re-checks and returns
/// [`ChatError::DuplicateUsername`] rather than trusting the caller, since it
/// is cheap to do so and this function is the only mutation path.
pub fn create_account(db: &mut Database, username: &str, password: &str) -> Result<User, ChatError> {
    if check_username_exists(db, username) {
        return Err(ChatError::DuplicateUsername);
    }
    let user = User::new(ids::new_uid(), username.to_string(), auth::hash_password(password));
    db.users.insert(user.uid.clone(), user.clone());
    Ok(user)
}

/// Lists active usernames matching a standard filename-glob pattern.
pub fn list_accounts(db: &Database, pattern: &str) -> Vec<String> {
    let matcher = WildMatch::new(pattern);
    let mut names: Vec<String> = db
        .users
        .values()
        .filter(|u| u.active && matcher.matches(&u.username))
        .map(|u| u.username.clone())
        .collect();
    names.sort();
    names
}

pub fn send_message(
    db: &mut Database,
    sender_username: &str,
    receiver_username: &str,
    text: &str,
    timestamp: &str,
) -> Result<Message, ChatError> {
    if text.chars().count() > MAX_MESSAGE_TEXT_CODE_POINTS {
        return Err(ChatError::TextTooLong);
    }
    let sender_uid = db
        .find_active_user_by_username(sender_username)
        .ok_or(ChatError::UnknownUser)?
        .uid
        .clone();
    let receiver_uid = db
        .find_active_user_by_username(receiver_username)
        .ok_or(ChatError::UnknownUser)?
        .uid
        .clone();

    let message = Message {
        mid: ids::new_mid(),
        sender_uid: sender_uid.clone(),
        receiver_uid: receiver_uid.clone(),
        sender_username: sender_username.to_string(),
        receiver_username: receiver_username.to_string(),
        text: text.to_string(),
        timestamp: timestamp.to_string(),
        receiver_read: false,
    };

    db.users.get_mut(&sender_uid).unwrap().sent_mids.push(message.mid.clone());
    db.users.get_mut(&receiver_uid).unwrap().received_mids.push(message.mid.clone());
    db.messages.insert(message.mid.clone(), message.clone());
    Ok(message)
}

pub fn get_sent_mids(db: &Database, username: &str) -> Result<Vec<String>, ChatError> {
    Ok(db
        .find_user_by_username(username)
        .ok_or(ChatError::UnknownUser)?
        .sent_mids
        .clone())
}

pub fn get_received_mids(db: &Database, username: &str) -> Result<Vec<String>, ChatError> {
    Ok(db
        .find_user_by_username(username)
        .ok_or(ChatError::UnknownUser)?
        .received_mids
        .clone())
}

pub fn get_message(db: &Database, mid: &str) -> Option<&Message> {
    db.messages.get(mid)
}

pub fn mark_read(db: &mut Database, mid: &str) -> Result<(), ChatError> {
    db.messages
        .get_mut(mid)
        .ok_or(ChatError::UnknownMessage)?
        .receiver_read = true;
    Ok(())
}

/// Unlinks the given mids from `username`'s own sent/received lists. The
/// message record itself is retained regardless of whether the other party
/// still references it; there is no garbage collection of message records.
///
/// Unlinking still happens for every mid that does exist even when some of
/// `mids` are unknown; the `Err` only reports that the caller asked for
/// something partially bogus, it does not roll the valid part back.
pub fn delete_messages(db: &mut Database, username: &str, mids: &[String]) -> Result<(), ChatError> {
    let any_unknown = mids.iter().any(|m| !db.messages.contains_key(m));
    let user = db
        .find_user_by_username_mut(username)
        .ok_or(ChatError::UnknownUser)?;
    user.sent_mids.retain(|m| !mids.contains(m));
    user.received_mids.retain(|m| !mids.contains(m));
    if any_unknown {
        return Err(ChatError::UnknownMessage);
    }
    Ok(())
}

/// Deactivates an account. The account's historical messages remain visible
/// to counterparties; `active` merely excludes the user from
/// [`list_accounts`] and future logins.
pub fn delete_account(db: &mut Database, username: &str) -> Result<(), ChatError> {
    let user = db
        .find_user_by_username_mut(username)
        .ok_or(ChatError::UnknownUser)?;
    user.active = false;
    Ok(())
}
