//! In-memory store for discovery results, imported things and endpoints

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::model::{DiscoveredThing, DiscoveryEndpoint, Thing};
use crate::registry::{EndpointRegistry, ThingStore};

/// Shared state accessible by the discovery service and the API
#[derive(Debug, Default)]
pub struct SharedState {
    pub discovered: Vec<DiscoveredThing>,
    pub things: Vec<Thing>,
    pub endpoints: Vec<DiscoveryEndpoint>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or refresh a discovery endpoint
    pub fn upsert_endpoint(&mut self, url: &str, thing_count: usize) {
        let now = Utc::now();
        if let Some(endpoint) = self.endpoints.iter_mut().find(|e| e.url == url) {
            endpoint.thing_count = thing_count;
            endpoint.last_scan = now;
        } else {
            self.endpoints.push(DiscoveryEndpoint {
                url: url.to_string(),
                thing_count,
                last_scan: now,
            });
        }
    }

    /// Insert a thing, replacing one with the same id. Returns true if replaced.
    pub fn upsert_thing(&mut self, thing: Thing) -> bool {
        if let Some(existing) = self.things.iter_mut().find(|t| t.id == thing.id) {
            *existing = thing;
            true
        } else {
            self.things.push(thing);
            false
        }
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle() -> StateHandle {
    Arc::new(RwLock::new(SharedState::new()))
}

#[async_trait]
impl EndpointRegistry for RwLock<SharedState> {
    async fn register_endpoint(&self, url: &str, thing_count: usize) {
        tracing::debug!("Registering endpoint {} ({} things)", url, thing_count);
        self.write().await.upsert_endpoint(url, thing_count);
    }
}

#[async_trait]
impl ThingStore for RwLock<SharedState> {
    async fn set_discovered_things(&self, things: Vec<DiscoveredThing>) {
        self.write().await.discovered = things;
    }

    async fn discovered_thing(&self, id: &str) -> Option<DiscoveredThing> {
        self.read()
            .await
            .discovered
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    async fn import_thing(&self, thing: Thing) {
        let id = thing.id.clone();
        if self.write().await.upsert_thing(thing) {
            tracing::debug!("Replaced imported thing '{}'", id);
        } else {
            tracing::debug!("Imported thing '{}'", id);
        }
    }
}
