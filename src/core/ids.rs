// src/core/ids.rs

//! Identifier generation for users and messages.
//!
//! A `uid`/`mid` is a UUID v4 rendered as its standard 36-character
//! hyphenated string. Collisions are not checked for; the identifier space
//! is large enough that this system treats them as non-occurring, same as
//! upstream UUID-based identifier schemes elsewhere in the ecosystem.

pub fn new_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn new_mid() -> String {
    uuid::Uuid::new_v4().to_string()
}
