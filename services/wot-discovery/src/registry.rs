//! Collaborator seams fed by discovery runs

use async_trait::async_trait;

use crate::model::{DiscoveredThing, Thing};

/// Records base URLs that turned out to serve Thing Descriptions
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait EndpointRegistry: Send + Sync {
    async fn register_endpoint(&self, url: &str, thing_count: usize);
}

/// Holds the latest discovery results and the imported things
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ThingStore: Send + Sync {
    /// Replace the discovered list with the results of a new run
    async fn set_discovered_things(&self, things: Vec<DiscoveredThing>);

    /// Look up a thing from the latest run
    async fn discovered_thing(&self, id: &str) -> Option<DiscoveredThing>;

    /// Add a thing, replacing any existing thing with the same id
    async fn import_thing(&self, thing: Thing);
}
