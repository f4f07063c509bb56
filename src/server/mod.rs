// src/server/mod.rs

//! Three-phase startup: load configuration-derived state, spawn background
//! tasks, then run the RPC accept loop until the process is killed.

mod initialization;
mod metrics_server;
mod spawner;

use crate::config::Config;
use crate::rpc::server::ChatServer;
use crate::rpc::service::ChatService;
use anyhow::Result;
use futures::{future, StreamExt};
use tarpc::server::{self, Channel};
use tarpc::tokio_serde::formats::Bincode;
use tracing::{info, warn};

pub async fn run(config: Config) -> Result<()> {
    let state = initialization::setup(config.clone())?;

    let addr: std::net::SocketAddr = config.address().parse()?;
    let listener = tarpc::serde_transport::tcp::listen(addr, Bincode::default).await?;
    info!(address = %config.address(), "rpc accept loop running");

    // The listener must be accepting connections before we announce
    // ourselves to a leader: `RegisterReplica` triggers an immediate
    // call-back into us to push the initial snapshot.
    let accept_state = state.clone();
    let mut accept_loop = tokio::spawn(async move {
        listener
            .filter_map(|r| future::ready(r.ok()))
            .map(server::BaseChannel::with_defaults)
            .map(|channel| {
                let server = ChatServer::new(accept_state.clone());
                channel.execute(server.serve()).for_each(|fut| {
                    tokio::spawn(fut);
                    future::ready(())
                })
            })
            .buffer_unordered(256)
            .for_each(|_| async {})
            .await;
    });

    initialization::join_if_follower(&state, &config).await;
    let _background_tasks = spawner::spawn_all(state.clone(), &config);

    (&mut accept_loop).await?;
    warn!("rpc accept loop terminated");
    Ok(())
}
