//! netgauge -- network link reporting and active HTTP speed probing.
//!
//! This crate answers two kinds of question about the machine's connectivity:
//! what the OS already knows about the active link (transport type,
//! negotiated capability, Wi-Fi signal), and what a real, timed HTTP
//! transfer achieves against a remote target. The first is a pass-through
//! read in [`net`]; the second is an active measurement in [`probe`].
//!
//! Operations are exposed three ways: the method-call surface in [`bridge`],
//! the HTTP API in [`api`], and the `netgauge` binary's subcommands. On all
//! of them, failures resolve to sentinels (`"unknown"`, 0.0 Mbps, signal -1)
//! rather than errors; [`probe::ProbeOutcome`] keeps the full story for
//! in-process callers.

pub mod api;
pub mod bridge;
pub mod config;
pub mod net;
pub mod probe;
pub mod service;

use std::sync::Arc;

use anyhow::Result;

use crate::api::state::AppState;
use crate::config::Config;
use crate::service::SpeedService;

/// Start the netgauge daemon: the HTTP API server over one shared service.
pub async fn serve(bind: &str, config: Config) -> Result<()> {
    let service = Arc::new(SpeedService::new(&config));
    let app = api::router(AppState { service });

    let addr: std::net::SocketAddr = bind.parse()?;
    tracing::info!(%addr, "netgauge listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
