// src/rpc/server.rs

//! Dispatches incoming RPCs to Chat Logic, the Replication Engine, or the
//! Failure Detector as appropriate. Mutating client RPCs are only honored
//! while this replica believes itself the leader; on a follower they come
//! back as `success: false` with `leader_address` pointed at the believed
//! leader, per the error handling design.

use crate::core::chat;
use crate::core::errors::ChatError;
use crate::core::replication;
use crate::core::state::ServerState;
use crate::core::store;
use crate::core::types::{Message, User};
use crate::rpc::messages::*;
use crate::rpc::service::ChatService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tarpc::context::Context;
use tracing::{info, warn};

#[derive(Clone)]
pub struct ChatServer {
    pub state: Arc<ServerState>,
}

impl ChatServer {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    async fn leader_address(&self) -> Option<String> {
        self.state.current_leader_address().await
    }

    /// Builds the `(reason, leader_address)` pair returned by every
    /// mutating handler when this replica is not the leader.
    async fn not_leader(&self) -> (String, Option<String>) {
        let leader_address = self.leader_address().await;
        let err = ChatError::NotLeader { leader_address: leader_address.clone() };
        (reason(&err), leader_address)
    }
}

fn reason(e: &ChatError) -> String {
    e.to_string()
}

fn record_rpc(method: &str) {
    crate::core::metrics::RPCS_PROCESSED_TOTAL
        .with_label_values(&[method])
        .inc();
}

impl ChatService for ChatServer {
    async fn login_username(self, _: Context, username: String) -> LoginUsernameResponse {
        record_rpc("login_username");
        let db = self.state.db.lock().await;
        LoginUsernameResponse {
            exists: chat::check_username_exists(&db, &username),
        }
    }

    async fn list_accounts(self, _: Context, pattern: String) -> ListAccountsResponse {
        record_rpc("list_accounts");
        let db = self.state.db.lock().await;
        ListAccountsResponse {
            usernames: chat::list_accounts(&db, &pattern),
        }
    }

    async fn get_sent_messages(self, _: Context, username: String) -> GetMidsResponse {
        record_rpc("get_sent_messages");
        let db = self.state.db.lock().await;
        match chat::get_sent_mids(&db, &username) {
            Ok(mids) => GetMidsResponse { success: true, mids, reason: None },
            Err(e) => GetMidsResponse { success: false, mids: vec![], reason: Some(reason(&e)) },
        }
    }

    async fn get_received_messages(self, _: Context, username: String) -> GetMidsResponse {
        record_rpc("get_received_messages");
        let db = self.state.db.lock().await;
        match chat::get_received_mids(&db, &username) {
            Ok(mids) => GetMidsResponse { success: true, mids, reason: None },
            Err(e) => GetMidsResponse { success: false, mids: vec![], reason: Some(reason(&e)) },
        }
    }

    async fn get_message_by_mid(self, _: Context, mid: String) -> GetMessageResponse {
        record_rpc("get_message_by_mid");
        let db = self.state.db.lock().await;
        match chat::get_message(&db, &mid) {
            Some(m) => GetMessageResponse { found: true, message: Some(MessageData::from(m)) },
            None => GetMessageResponse { found: false, message: None },
        }
    }

    async fn login_password(
        self,
        _: Context,
        username: String,
        password: String,
    ) -> LoginPasswordResponse {
        record_rpc("login_password");
        if !self.state.is_leader() {
            let (reason, leader_address) = self.not_leader().await;
            return LoginPasswordResponse { success: false, uid: None, reason: Some(reason), leader_address };
        }
        let mut db = self.state.db.lock().await;

        // First-login creates the account; subsequent logins must match.
        let result = if chat::check_username_exists(&db, &username) {
            chat::verify_password(&db, &username, &password).map(|u| u.uid.clone())
        } else {
            chat::create_account(&mut db, &username, &password).map(|u| u.uid)
        };

        match result {
            Ok(uid) => {
                self.commit_and_fanout(&db).await;
                LoginPasswordResponse { success: true, uid: Some(uid), reason: None, leader_address: None }
            }
            Err(e) => LoginPasswordResponse {
                success: false,
                uid: None,
                reason: Some(reason(&e)),
                leader_address: None,
            },
        }
    }

    async fn delete_account(self, _: Context, username: String) -> DeleteAccountResponse {
        record_rpc("delete_account");
        if !self.state.is_leader() {
            let (reason, leader_address) = self.not_leader().await;
            return DeleteAccountResponse { success: false, reason: Some(reason), leader_address };
        }
        let mut db = self.state.db.lock().await;
        match chat::delete_account(&mut db, &username) {
            Ok(()) => {
                self.commit_and_fanout(&db).await;
                DeleteAccountResponse { success: true, reason: None, leader_address: None }
            }
            Err(e) => DeleteAccountResponse { success: false, reason: Some(reason(&e)), leader_address: None },
        }
    }

    async fn send_message(
        self,
        _: Context,
        sender_username: String,
        receiver_username: String,
        text: String,
        timestamp: String,
    ) -> SendMessageResponse {
        record_rpc("send_message");
        if !self.state.is_leader() {
            let (reason, leader_address) = self.not_leader().await;
            return SendMessageResponse { success: false, mid: None, reason: Some(reason), leader_address };
        }
        let mut db = self.state.db.lock().await;
        match chat::send_message(&mut db, &sender_username, &receiver_username, &text, &timestamp) {
            Ok(msg) => {
                self.commit_and_fanout(&db).await;
                SendMessageResponse { success: true, mid: Some(msg.mid), reason: None, leader_address: None }
            }
            Err(e) => SendMessageResponse { success: false, mid: None, reason: Some(reason(&e)), leader_address: None },
        }
    }

    async fn mark_message_read(self, _: Context, mid: String) -> MarkMessageReadResponse {
        record_rpc("mark_message_read");
        if !self.state.is_leader() {
            let (reason, leader_address) = self.not_leader().await;
            return MarkMessageReadResponse { success: false, reason: Some(reason), leader_address };
        }
        let mut db = self.state.db.lock().await;
        match chat::mark_read(&mut db, &mid) {
            Ok(()) => {
                self.commit_and_fanout(&db).await;
                MarkMessageReadResponse { success: true, reason: None, leader_address: None }
            }
            Err(e) => MarkMessageReadResponse { success: false, reason: Some(reason(&e)), leader_address: None },
        }
    }

    async fn delete_messages(self, _: Context, username: String, mids: Vec<String>) -> DeleteMessagesResponse {
        record_rpc("delete_messages");
        if !self.state.is_leader() {
            let (reason, leader_address) = self.not_leader().await;
            return DeleteMessagesResponse { success: false, reason: Some(reason), leader_address };
        }
        let mut db = self.state.db.lock().await;
        match chat::delete_messages(&mut db, &username, &mids) {
            Ok(()) => {
                self.commit_and_fanout(&db).await;
                DeleteMessagesResponse { success: true, reason: None, leader_address: None }
            }
            // `UnknownMessage` means some requested mids were bogus but the
            // known ones were still unlinked, so that partial mutation must
            // still be persisted and fanned out like any other commit.
            Err(e @ ChatError::UnknownMessage) => {
                self.commit_and_fanout(&db).await;
                DeleteMessagesResponse { success: false, reason: Some(reason(&e)), leader_address: None }
            }
            Err(e) => DeleteMessagesResponse { success: false, reason: Some(reason(&e)), leader_address: None },
        }
    }

    async fn register_replica(self, _: Context, address: String) -> RegisterReplicaResponse {
        record_rpc("register_replica");
        let is_new = {
            let mut list = self.state.replica_list.write().await;
            if list.contains(&address) {
                false
            } else {
                list.push(address.clone());
                list.sort();
                true
            }
        };
        let replica_list = self.state.replica_list.read().await.clone();

        if is_new {
            info!(replica = %address, "registered new replica");
            let (users, messages) = {
                let db = self.state.db.lock().await;
                (
                    db.users.values().map(UserData::from).collect::<Vec<_>>(),
                    db.messages.values().map(MessageData::from).collect::<Vec<_>>(),
                )
            };
            if let Err(e) = replication::push_snapshot(&address, users, messages).await {
                warn!(replica = %address, error = %e, "failed to push initial state to new replica");
            }
            replication::push_replica_list(&self.state, &replica_list, &address).await;
        }

        RegisterReplicaResponse {
            success: true,
            replica_list,
            leader_address: self.state.current_leader_address().await,
        }
    }

    async fn sync_users_from_leader(self, _: Context, users: Vec<UserData>) -> SyncAckResponse {
        record_rpc("sync_users_from_leader");
        let mut db = self.state.db.lock().await;
        let users = users.into_iter().map(|u| (u.uid.clone(), User::from(u))).collect();
        store::apply_users(&mut db, users);
        crate::core::metrics::USER_COUNT.set(db.users.len() as f64);
        if let Err(e) = self.state.save_locked(&db) {
            warn!(error = %e, "failed to persist synced snapshot");
        }
        SyncAckResponse { success: true }
    }

    async fn sync_messages_from_leader(self, _: Context, messages: Vec<MessageData>) -> SyncAckResponse {
        record_rpc("sync_messages_from_leader");
        let mut db = self.state.db.lock().await;
        let messages = messages.into_iter().map(|m| (m.mid.clone(), Message::from(m))).collect();
        store::apply_messages(&mut db, messages);
        crate::core::metrics::MESSAGE_COUNT.set(db.messages.len() as f64);
        if let Err(e) = self.state.save_locked(&db) {
            warn!(error = %e, "failed to persist synced snapshot");
        }
        SyncAckResponse { success: true }
    }

    async fn sync_replica_list_from_leader(self, _: Context, replica_list: Vec<String>) -> SyncAckResponse {
        record_rpc("sync_replica_list_from_leader");
        *self.state.replica_list.write().await = replica_list;
        SyncAckResponse { success: true }
    }

    async fn heartbeat(self, _: Context, from_address: String, from_is_leader: bool) -> HeartbeatResponse {
        record_rpc("heartbeat");
        if from_is_leader {
            *self.state.leader_address.write().await = Some(from_address);
        }
        HeartbeatResponse {
            alive: true,
            is_leader: self.state.is_leader.load(Ordering::Acquire),
            leader_address: self.state.current_leader_address().await,
        }
    }
}

impl ChatServer {
    /// Persists the mutation and fans it out to every other replica. Called
    /// only on the leader, only after Chat Logic has accepted a mutation,
    /// while still holding the `db` lock passed in.
    async fn commit_and_fanout(&self, db: &tokio::sync::MutexGuard<'_, crate::core::types::Database>) {
        crate::core::metrics::USER_COUNT.set(db.users.len() as f64);
        crate::core::metrics::MESSAGE_COUNT.set(db.messages.len() as f64);
        if let Err(e) = self.state.save_locked(db) {
            warn!(error = %e, "failed to persist leader snapshot");
        }
        replication::fanout_to_replicas(&self.state, db).await;
    }
}
