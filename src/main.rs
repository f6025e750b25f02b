// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use community_ledger_server::{
    api::router,
    config::{Config, JWT_SECRET_ENV},
    logging,
    state::AppState,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.log_format);

    if config.jwt_secret.is_generated() {
        tracing::warn!(
            "{JWT_SECRET_ENV} is not set; using a random secret. Sessions end when the process restarts."
        );
    }

    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, data_dir = %config.data_dir.display(), "Failed to open data directory");
            return ExitCode::FAILURE;
        }
    };

    match state.blobs.clear_staging() {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Removed interrupted attachment writes"),
        Err(e) => tracing::warn!(error = %e, "Failed to clear attachment staging area"),
    }

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        %addr,
        data_dir = %config.data_dir.display(),
        "Community ledger listening (docs at /docs)"
    );

    if let Err(e) = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
