//! BDD test world for the discovery service

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cucumber::World;
use wot_discovery::config::DiscoveryConfig;
use wot_discovery::io::{HttpClient, HttpResponse};
use wot_discovery::state::StateHandle;
use wot_discovery::{
    DiscoveredThing, Discovery, DiscoveryOutcome, Thing, ValidationResult, WotError,
};

/// HTTP client that serves canned responses by URL; unknown URLs get a 404
#[derive(Debug, Default, Clone)]
pub struct FixedHttpClient {
    pub responses: HashMap<String, HttpResponse>,
    pub stalled: Vec<String>,
}

#[async_trait::async_trait]
impl HttpClient for FixedHttpClient {
    async fn get(&self, url: &str, _timeout: Duration) -> wot_discovery::Result<HttpResponse> {
        if self.stalled.iter().any(|stalled| stalled == url) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(self.responses.get(url).cloned().unwrap_or(HttpResponse {
            status: 404,
            content_type: Some("text/plain".to_string()),
            body: "not found".to_string(),
        }))
    }
}

#[derive(Debug, Default, World)]
pub struct DiscoveryWorld {
    // Discovery testing
    pub http: FixedHttpClient,
    pub config: DiscoveryConfig,
    pub state: Option<StateHandle>,
    pub discovery: Option<Arc<Discovery>>,
    pub outcome: Option<Result<DiscoveryOutcome, WotError>>,

    // Validation testing
    pub td_text: Option<String>,
    pub validation: Option<ValidationResult>,

    // Import testing
    pub discovered: Option<DiscoveredThing>,
    pub thing: Option<Thing>,
}

impl DiscoveryWorld {
    /// The discovery service, built on first use from the canned responses
    pub fn discovery(&mut self) -> Arc<Discovery> {
        let state = self
            .state
            .get_or_insert_with(wot_discovery::state::new_state_handle)
            .clone();
        let http = self.http.clone();
        let config = self.config.clone();
        self.discovery
            .get_or_insert_with(|| Arc::new(Discovery::new(Arc::new(http), state, config)))
            .clone()
    }

    pub fn result(&self) -> &DiscoveryOutcome {
        match self.outcome.as_ref() {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => panic!("discovery failed: {}", e),
            None => panic!("no discovery has run"),
        }
    }
}
