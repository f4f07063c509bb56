// tests/replication_test.rs

//! End-to-end replication tests driving two real `chatterd` replicas over
//! loopback TCP: the join protocol's full-state push to a new follower, and
//! steady-state fan-out of later mutations. Mirrors the two-replica portion
//! of the end-to-end scenarios (account creation replicates; send+read).

use chatterd::config::{Config, Role};
use chatterd::core::replication;
use chatterd::core::store::{self, SnapshotPaths};
use std::time::Duration;
use tokio::time::sleep;

fn test_config(port: u16, role: Role, leader_address: Option<String>, data_dir: &std::path::Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port,
        role,
        leader_address,
        peers: vec![],
        data_dir: data_dir.to_path_buf(),
        heartbeat_interval: Duration::from_millis(60),
        heartbeat_timeout: Duration::from_millis(400),
        log_level: "error".to_string(),
        metrics_enabled: false,
        metrics_port: 0,
    }
}

#[tokio::test]
async fn join_pushes_full_state_and_fanout_propagates_later_mutations() {
    let leader_dir = tempfile::tempdir().unwrap();
    let follower_dir = tempfile::tempdir().unwrap();

    let leader_port = 19380;
    let follower_port = 19381;
    let leader_addr = format!("127.0.0.1:{leader_port}");
    let follower_addr = format!("127.0.0.1:{follower_port}");

    let leader_cfg = test_config(leader_port, Role::Leader, None, leader_dir.path());
    let _leader_task = tokio::spawn(chatterd::server::run(leader_cfg));
    sleep(Duration::from_millis(150)).await;

    // Create an account on the leader *before* the follower joins, so the
    // join protocol's full-state push is what carries it over.
    let leader_client = replication::connect(&leader_addr).await.unwrap();
    let ctx = || {
        let mut c = tarpc::context::current();
        c.deadline = std::time::Instant::now() + Duration::from_secs(2);
        c
    };
    let resp = leader_client
        .login_password(ctx(), "alice".to_string(), "pw".to_string())
        .await
        .unwrap();
    assert!(resp.success, "account creation on leader must succeed");

    let follower_cfg = test_config(
        follower_port,
        Role::Follower,
        Some(leader_addr.clone()),
        follower_dir.path(),
    );
    let _follower_task = tokio::spawn(chatterd::server::run(follower_cfg));
    sleep(Duration::from_millis(250)).await;

    // The follower's in-memory state and its on-disk snapshot must both
    // already reflect alice, pushed by the leader's join handler.
    let follower_client = replication::connect(&follower_addr).await.unwrap();
    let exists = follower_client
        .login_username(ctx(), "alice".to_string())
        .await
        .unwrap();
    assert!(exists.exists, "follower must have alice after joining");

    let on_disk = store::load(&SnapshotPaths::for_address(follower_dir.path(), &follower_addr)).unwrap();
    let follower_alice = on_disk
        .find_user_by_username("alice")
        .expect("follower must have alice on disk");

    // The synced `User` must equal the leader's in full, including the
    // password digest, not just carry a matching username.
    let leader_disk = store::load(&SnapshotPaths::for_address(leader_dir.path(), &leader_addr)).unwrap();
    let leader_alice = leader_disk
        .find_user_by_username("alice")
        .expect("leader must have alice on disk");
    assert_eq!(follower_alice, leader_alice);
    assert!(!follower_alice.password_digest.is_empty());

    // Steady-state: a mutation on the leader after the follower has joined
    // must fan out and persist on the follower too.
    let bob_resp = leader_client
        .login_password(ctx(), "bob".to_string(), "pw".to_string())
        .await
        .unwrap();
    assert!(bob_resp.success);

    let send_resp = leader_client
        .send_message(
            ctx(),
            "alice".to_string(),
            "bob".to_string(),
            "hi".to_string(),
            "t0".to_string(),
        )
        .await
        .unwrap();
    assert!(send_resp.success);
    let mid = send_resp.mid.unwrap();

    // The fan-out is awaited inside the leader's handler before it replies,
    // so by the time send_message returns, the follower should already
    // have the message.
    let on_follower = follower_client
        .get_message_by_mid(ctx(), mid.clone())
        .await
        .unwrap();
    assert!(on_follower.found, "follower must see the message after fan-out");
    assert_eq!(on_follower.message.unwrap().text, "hi");

    let follower_disk = store::load(&SnapshotPaths::for_address(follower_dir.path(), &follower_addr)).unwrap();
    assert!(follower_disk.messages.contains_key(&mid));
}

#[tokio::test]
async fn follower_rejects_mutations_with_leader_address() {
    let leader_dir = tempfile::tempdir().unwrap();
    let follower_dir = tempfile::tempdir().unwrap();

    let leader_port = 19382;
    let follower_port = 19383;
    let leader_addr = format!("127.0.0.1:{leader_port}");
    let follower_addr = format!("127.0.0.1:{follower_port}");

    let leader_cfg = test_config(leader_port, Role::Leader, None, leader_dir.path());
    let _leader_task = tokio::spawn(chatterd::server::run(leader_cfg));
    sleep(Duration::from_millis(150)).await;

    let follower_cfg = test_config(
        follower_port,
        Role::Follower,
        Some(leader_addr.clone()),
        follower_dir.path(),
    );
    let _follower_task = tokio::spawn(chatterd::server::run(follower_cfg));
    sleep(Duration::from_millis(250)).await;

    let follower_client = replication::connect(&follower_addr).await.unwrap();
    let mut ctx = tarpc::context::current();
    ctx.deadline = std::time::Instant::now() + Duration::from_secs(2);

    let resp = follower_client
        .login_password(ctx, "carol".to_string(), "pw".to_string())
        .await
        .unwrap();
    assert!(!resp.success);
    assert_eq!(resp.leader_address.as_deref(), Some(leader_addr.as_str()));
}
