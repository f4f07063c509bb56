// tests/chat_logic_test.rs

//! End-to-end exercises of the chat logic layer through a single
//! `Database`, covering the boundary cases called out in the data model.

use chatterd::core::chat;
use chatterd::core::errors::ChatError;
use chatterd::core::types::Database;

#[test]
fn full_conversation_flow() {
    let mut db = Database::new();
    chat::create_account(&mut db, "alice", "s3cret").unwrap();
    chat::create_account(&mut db, "bob", "hunter2").unwrap();

    assert!(chat::verify_password(&db, "alice", "s3cret").is_ok());
    assert!(matches!(
        chat::verify_password(&db, "alice", "nope"),
        Err(ChatError::AuthFailed)
    ));

    let msg1 = chat::send_message(&mut db, "alice", "bob", "hey bob", "t0").unwrap();
    let msg2 = chat::send_message(&mut db, "bob", "alice", "hey alice", "t1").unwrap();

    assert_eq!(chat::get_sent_mids(&db, "alice").unwrap(), vec![msg1.mid.clone()]);
    assert_eq!(chat::get_received_mids(&db, "alice").unwrap(), vec![msg2.mid.clone()]);

    chat::mark_read(&mut db, &msg1.mid).unwrap();
    assert!(chat::get_message(&db, &msg1.mid).unwrap().receiver_read);

    chat::delete_messages(&mut db, "bob", &[msg2.mid.clone()]).unwrap();
    assert!(chat::get_sent_mids(&db, "bob").unwrap().is_empty());
    // The record survives; alice still sees it in her received list.
    assert!(chat::get_received_mids(&db, "alice").unwrap().contains(&msg2.mid));

    chat::delete_account(&mut db, "bob").unwrap();
    assert!(chat::list_accounts(&db, "*").iter().all(|u| u != "bob"));
    assert!(matches!(
        chat::verify_password(&db, "bob", "hunter2"),
        Err(ChatError::UnknownUser)
    ));
}

#[test]
fn unknown_user_and_message_errors() {
    let mut db = Database::new();
    assert!(matches!(
        chat::send_message(&mut db, "nobody", "also_nobody", "hi", "t0"),
        Err(ChatError::UnknownUser)
    ));
    assert!(matches!(
        chat::mark_read(&mut db, "does-not-exist"),
        Err(ChatError::UnknownMessage)
    ));
    assert!(chat::get_message(&db, "does-not-exist").is_none());
}

#[test]
fn duplicate_username_is_rejected() {
    let mut db = Database::new();
    chat::create_account(&mut db, "alice", "pw1").unwrap();
    assert!(matches!(
        chat::create_account(&mut db, "alice", "pw2"),
        Err(ChatError::DuplicateUsername)
    ));
}
