// src/rpc/service.rs

//! The typed request/response surface every replica exposes, as a
//! `tarpc` service. `tarpc::context::Context` carries each call's deadline,
//! which is how this system satisfies its per-call-timeout requirement
//! without hand-rolling any framing of its own.

use crate::rpc::messages::*;

#[tarpc::service]
pub trait ChatService {
    // --- Client-facing, read-only: served by leader and followers alike ---
    async fn login_username(username: String) -> LoginUsernameResponse;
    async fn list_accounts(pattern: String) -> ListAccountsResponse;
    async fn get_sent_messages(username: String) -> GetMidsResponse;
    async fn get_received_messages(username: String) -> GetMidsResponse;
    async fn get_message_by_mid(mid: String) -> GetMessageResponse;

    // --- Client-facing, mutating: leader-only, `NotLeader` on a follower ---
    async fn login_password(username: String, password: String) -> LoginPasswordResponse;
    async fn delete_account(username: String) -> DeleteAccountResponse;
    async fn send_message(
        sender_username: String,
        receiver_username: String,
        text: String,
        timestamp: String,
    ) -> SendMessageResponse;
    async fn mark_message_read(mid: String) -> MarkMessageReadResponse;
    async fn delete_messages(username: String, mids: Vec<String>) -> DeleteMessagesResponse;

    // --- Replica-to-replica: served regardless of role ---
    async fn register_replica(address: String) -> RegisterReplicaResponse;
    async fn sync_users_from_leader(users: Vec<UserData>) -> SyncAckResponse;
    async fn sync_messages_from_leader(messages: Vec<MessageData>) -> SyncAckResponse;
    async fn sync_replica_list_from_leader(replica_list: Vec<String>) -> SyncAckResponse;
    async fn heartbeat(from_address: String, from_is_leader: bool) -> HeartbeatResponse;
}
