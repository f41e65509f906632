// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Agency admin API server.
//!
//! Serves the session-gated admin API, the Google/Firebase login routes and
//! the public signup endpoints used by the brand sites.

use agency_admin::{
    config::Config,
    db::{DocumentStore, FirestoreDb},
    services::{FirebaseTokenVerifier, GoogleOAuthClient},
    AppState,
};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config
        .require_google_oauth()
        .context("Google OAuth is required to serve the admin API")?;
    tracing::info!(port = config.port, "Starting agency admin API");

    let db: Arc<dyn DocumentStore> = Arc::new(
        FirestoreDb::new(&config.gcp_project_id)
            .await
            .context("Failed to connect to Firestore")?,
    );

    // Only the migration jobs read from the legacy project.
    let legacy_db: Option<Arc<dyn DocumentStore>> = match &config.legacy_firestore_project_id {
        Some(project) => Some(Arc::new(
            FirestoreDb::new(project)
                .await
                .context("Failed to connect to legacy Firestore")?,
        )),
        None => None,
    };

    let google_oauth = GoogleOAuthClient::new(&config)?;
    let firebase_verifier = FirebaseTokenVerifier::new(&config)?;

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        legacy_db,
        google_oauth,
        firebase_verifier,
    });

    let app = agency_admin::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agency_admin=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
