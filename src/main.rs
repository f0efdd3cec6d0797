// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::error::Error;
use std::net::SocketAddr;

use axum_server::Handle;
use devloger_auth::{
    api,
    config::{LogFormat, ServiceMode, Settings},
    gateway, server,
    state::{GatewayState, IdentityState},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    telemetry::init(LogFormat::from_env())?;

    let settings = Settings::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    let app = match settings.mode {
        ServiceMode::Gateway => {
            let state = GatewayState::from_settings(&settings)?;
            tracing::info!(
                stages = ?state.pipeline.stage_names(),
                upstreams = settings.routes.len(),
                "Gateway configured"
            );
            gateway::router(state)
        }
        ServiceMode::Identity => {
            let state = IdentityState::from_settings(&settings);
            tracing::info!(
                ttl_secs = settings.jwt.ttl.as_secs(),
                "Identity service configured"
            );
            api::router(state)
        }
    };

    let handle = Handle::<SocketAddr>::new();
    tokio::spawn(server::shutdown_on_ctrl_c(handle.clone()));

    tracing::info!(mode = ?settings.mode, addr = %settings.bind, "Listening");
    server::serve(app, settings.bind, handle).await?;

    tracing::info!("Server stopped");
    Ok(())
}
