// src/rpc/mod.rs

pub mod messages;
pub mod server;
pub mod service;

pub use server::ChatServer;
pub use service::{ChatService, ChatServiceClient};
