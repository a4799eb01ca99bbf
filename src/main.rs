// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! EngagePerfect local session server
//!
//! Signs the user in against Firebase Auth, follows their Firestore profile
//! live and serves the session and dashboard to the web client.

use engageperfect::{config::Config, db::FirestoreDb, services::FirebaseAuth, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting EngagePerfect session server");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.firebase_project_id).await?;

    // Initialize Firebase Auth; no session survives a restart
    let auth = Arc::new(FirebaseAuth::new(&config)?);

    // Build shared state (starts the session aggregator)
    let state = Arc::new(AppState::new(config.clone(), auth, db));

    // Build router
    let app = engageperfect::routes::create_router(state.clone());

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.session.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["engageperfect=debug", "info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry().with(filter).with(format).init();
}
