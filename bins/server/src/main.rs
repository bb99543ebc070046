//! Upload relay server
//!
//! Main entry point for the upload relay service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_api::{AppState, create_router};
use relay_core::storage::{SigningService, StorageConfig};
use relay_core::upload::{
    Authorizer, HttpAuthorizer, SigningAuthorizer, UploadOrchestrator, http_client,
};
use relay_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    let storage = StorageConfig::from_settings(&config.storage)?;

    // Create signing service
    let signing = Arc::new(SigningService::from_config(&storage)?);
    info!(
        backend = signing.backend_name(),
        bucket = %storage.bucket,
        max_upload_mb = signing.max_upload_mb(),
        "Storage backend configured"
    );

    // Create upload orchestrator
    let client = http_client(Duration::from_secs(config.upload.request_timeout_secs))?;
    let authorizer = match config.upload.authorizer_url.as_deref() {
        Some(base_url) if !base_url.trim().is_empty() => {
            let source = HttpAuthorizer::new(client.clone(), base_url)?;
            info!(endpoint = %source.endpoint(), "Using remote upload authorizer");
            Authorizer::Http(source)
        }
        _ => Authorizer::Signing(SigningAuthorizer::new(Arc::clone(&signing))),
    };
    let orchestrator = UploadOrchestrator::new(authorizer, client);

    // Create application state
    let state = AppState {
        signing,
        orchestrator: Arc::new(orchestrator),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
