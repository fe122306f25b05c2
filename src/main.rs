// SPDX-License-Identifier: MIT

//! Overlay Studio API Server
//!
//! Composites user photos onto image templates, driving the Canva Connect
//! API for brand-template designs and a Cloudinary overlay transform for
//! everything else.

use overlay_studio::{config::Config, db::FirestoreDb, services::CanvaService, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Overlay Studio API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize Canva service; the database doubles as its credential store
    let canva = CanvaService::new(
        config.canva_client_id.clone(),
        config.canva_client_secret.clone(),
        config.canva_api_base_url.clone(),
        config.canva_authorize_url.clone(),
        config.canva_redirect_uri(),
        Arc::new(db.clone()),
    );
    tracing::info!("Canva service initialized");

    // Build shared state
    let state = Arc::new(AppState { config: config.clone(), db, canva });

    // Build router
    let app = overlay_studio::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("overlay_studio=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
