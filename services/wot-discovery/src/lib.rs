//! WoT Discovery - Web of Things discovery and Thing Description validation
//!
//! Scans `/.well-known/wot` endpoints, validates the Thing Descriptions they
//! serve, and turns them into Thing records that can be imported.

pub mod api;
pub mod config;
pub mod discovery;
pub mod error;
pub mod io;
pub mod model;
pub mod registry;
pub mod state;
pub mod transform;
pub mod validator;
pub mod well_known;

pub use config::{load_config, Config};
pub use discovery::Discovery;
pub use error::{Result, WotError};
pub use model::{
    DiscoveredThing, DiscoveryOutcome, DiscoveryProgress, DiscoveryResult, Thing,
    ValidationResult,
};

use std::net::SocketAddr;
use std::sync::Arc;

use crate::io::ReqwestHttpClient;
use crate::registry::EndpointRegistry;

/// Build a discovery service backed by the production HTTP client
pub fn build_discovery(config: &Config, registry: Arc<dyn EndpointRegistry>) -> Discovery {
    Discovery::new(
        Arc::new(ReqwestHttpClient::new()),
        registry,
        config.discovery.clone(),
    )
}

/// Serve the JSON API until Ctrl-C
pub async fn serve(config: Config) -> Result<()> {
    let state = state::new_state_handle();
    let discovery = Arc::new(build_discovery(&config, state.clone()));
    let router = api::build_router(api::ApiState::new(state, Arc::clone(&discovery)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    discovery.dispose();
    tracing::info!("API stopped");
    Ok(())
}
