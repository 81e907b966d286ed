//! Discovery: scans base URLs for Thing Descriptions and validates them

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::DiscoveryConfig;
use crate::error::{Result, WotError};
use crate::io::HttpClient;
use crate::model::{
    DiscoveredThing, DiscoveryMethod, DiscoveryOutcome, DiscoveryPhase, DiscoveryProgress,
    DiscoveryResult, ScanFailure, ValidationStatus,
};
use crate::registry::EndpointRegistry;
use crate::validator;
use crate::well_known::{self, ThingIdGenerator};

const JSON_CONTENT_TYPES: [&str; 3] = [
    "application/json",
    "application/ld+json",
    "application/td+json",
];

/// The discovery service scans base URLs, validates what it finds and
/// registers the endpoints that served Thing Descriptions.
///
/// At most one scan runs per instance: starting a scan cancels the one in
/// flight. [`Discovery::dispose`] cancels everything and retires the instance.
pub struct Discovery {
    http: Arc<dyn HttpClient>,
    registry: Arc<dyn EndpointRegistry>,
    config: DiscoveryConfig,
    lifetime: CancellationToken,
    active: Mutex<Option<(u64, CancellationToken)>>,
    next_run: AtomicU64,
}

impl std::fmt::Debug for Discovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovery")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Discovery {
    pub fn new(
        http: Arc<dyn HttpClient>,
        registry: Arc<dyn EndpointRegistry>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            http,
            registry,
            config,
            lifetime: CancellationToken::new(),
            active: Mutex::new(None),
            next_run: AtomicU64::new(0),
        }
    }

    /// Scan `base_urls` without progress reporting
    pub async fn discover(&self, base_urls: &[String]) -> Result<DiscoveryOutcome> {
        self.discover_with_progress(base_urls, |_| {}).await
    }

    /// Scan `base_urls`, reporting progress after every step
    pub async fn discover_with_progress<F>(
        &self,
        base_urls: &[String],
        mut on_progress: F,
    ) -> Result<DiscoveryOutcome>
    where
        F: FnMut(&DiscoveryProgress) + Send,
    {
        let (run_id, cancel) = self.begin_run()?;
        tracing::info!("Discovery run {} started for {} URLs", run_id, base_urls.len());

        let outcome = self.run(base_urls, &cancel, &mut on_progress).await;
        self.finish_run(run_id);

        let result = outcome.result();
        if outcome.is_cancelled() {
            tracing::info!(
                "Discovery run {} cancelled with {} things, {} errors",
                run_id,
                result.discovered.len(),
                result.errors.len()
            );
        } else {
            tracing::info!(
                "Discovery run {} completed with {} things, {} errors",
                run_id,
                result.discovered.len(),
                result.errors.len()
            );
        }
        Ok(outcome)
    }

    /// Fetch and validate a single TD from a URL that serves it directly
    ///
    /// Counts as the active run: it supersedes a scan in flight and
    /// [`Discovery::cancel`] aborts it with [`WotError::Cancelled`].
    pub async fn discover_thing(&self, td_url: &str) -> Result<DiscoveredThing> {
        let (run_id, cancel) = self.begin_run()?;
        let fetched = self.fetch_document(td_url, &cancel).await;
        self.finish_run(run_id);

        let td = fetched?;
        if !td.is_object() {
            return Err(WotError::InvalidTd(format!(
                "{} did not return a JSON object",
                td_url
            )));
        }

        let mut thing = well_known::from_td(
            &td,
            td_url,
            DiscoveryMethod::Direct,
            &mut ThingIdGenerator::new(),
        );
        apply_validation(&mut thing);
        tracing::debug!(
            "Fetched '{}' from {} ({})",
            thing.id,
            td_url,
            thing.validation_status
        );
        Ok(thing)
    }

    /// Cancel the scan in flight, if any
    pub fn cancel(&self) {
        if let Some((run_id, token)) = self.lock_active().as_ref() {
            tracing::debug!("Cancelling discovery run {}", run_id);
            token.cancel();
        }
    }

    /// Cancel all work and refuse further scans
    pub fn dispose(&self) {
        tracing::debug!("Disposing discovery service");
        self.lifetime.cancel();
        self.lock_active().take();
    }

    pub fn is_running(&self) -> bool {
        self.lock_active().is_some()
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_run(&self) -> Result<(u64, CancellationToken)> {
        if self.lifetime.is_cancelled() {
            return Err(WotError::Disposed);
        }
        let run_id = self.next_run.fetch_add(1, Ordering::Relaxed) + 1;
        let token = self.lifetime.child_token();
        if let Some((previous, previous_token)) = self.lock_active().replace((run_id, token.clone()))
        {
            tracing::info!(
                "Discovery run {} superseded by run {}",
                previous,
                run_id
            );
            previous_token.cancel();
        }
        Ok((run_id, token))
    }

    fn finish_run(&self, run_id: u64) {
        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|(id, _)| *id == run_id) {
            active.take();
        }
    }

    async fn run<F>(
        &self,
        base_urls: &[String],
        cancel: &CancellationToken,
        on_progress: &mut F,
    ) -> DiscoveryOutcome
    where
        F: FnMut(&DiscoveryProgress) + Send,
    {
        let mut result = DiscoveryResult::default();
        let mut ids = ThingIdGenerator::new();
        let mut seen_ids = HashSet::new();
        let mut endpoints: Vec<(&String, usize)> = Vec::new();

        let mut progress = DiscoveryProgress {
            total: base_urls.len(),
            completed: 0,
            current: base_urls.first().cloned(),
            status: DiscoveryPhase::Scanning,
        };
        on_progress(&progress);

        for (index, base_url) in base_urls.iter().enumerate() {
            if cancel.is_cancelled() {
                return DiscoveryOutcome::Cancelled(result);
            }

            let scanned = match self.scan_url(base_url, &mut ids, cancel).await {
                Ok(things) => self.resolve_links(things, &mut ids, cancel, &mut result.errors).await,
                Err(e) => Err(e),
            };
            match scanned {
                Ok(things) => {
                    tracing::debug!("{} served {} things", base_url, things.len());
                    let mut kept = 0;
                    for thing in things {
                        if seen_ids.insert(thing.id.clone()) {
                            result.discovered.push(thing);
                            kept += 1;
                        } else {
                            tracing::warn!(
                                "Dropping duplicate thing id '{}' from {}",
                                thing.id,
                                base_url
                            );
                        }
                    }
                    if kept > 0 {
                        endpoints.push((base_url, kept));
                    }
                }
                Err(WotError::Cancelled) => return DiscoveryOutcome::Cancelled(result),
                Err(e) => {
                    tracing::warn!("Scanning {} failed: {}", base_url, e);
                    result.errors.push(ScanFailure {
                        url: base_url.clone(),
                        error: e.to_string(),
                    });
                }
            }

            progress.completed += 1;
            progress.current = base_urls.get(index + 1).cloned();
            on_progress(&progress);
        }

        let mut progress = DiscoveryProgress {
            total: result.discovered.len(),
            completed: 0,
            current: None,
            status: DiscoveryPhase::Validating,
        };
        on_progress(&progress);

        for thing in result.discovered.iter_mut() {
            if cancel.is_cancelled() {
                return DiscoveryOutcome::Cancelled(result);
            }
            apply_validation(thing);
            progress.completed += 1;
            progress.current = Some(thing.id.clone());
            on_progress(&progress);
        }

        for (base_url, count) in endpoints {
            self.registry.register_endpoint(base_url, count).await;
        }

        on_progress(&DiscoveryProgress {
            total: base_urls.len(),
            completed: base_urls.len(),
            current: None,
            status: DiscoveryPhase::Completed,
        });

        DiscoveryOutcome::Completed(result)
    }

    async fn scan_url(
        &self,
        base_url: &str,
        ids: &mut ThingIdGenerator,
        cancel: &CancellationToken,
    ) -> Result<Vec<DiscoveredThing>> {
        let url = well_known::well_known_url(base_url)?;
        tracing::debug!("Scanning {}", url);
        let body = self.fetch_document(&url, cancel).await?;
        well_known::parse_well_known(&body, base_url, ids)
    }

    /// Replace directory placeholders with the TDs they link to, when configured.
    /// Links that fail to resolve keep their placeholder and are recorded in
    /// `errors`; only cancellation aborts.
    async fn resolve_links(
        &self,
        things: Vec<DiscoveredThing>,
        ids: &mut ThingIdGenerator,
        cancel: &CancellationToken,
        errors: &mut Vec<ScanFailure>,
    ) -> Result<Vec<DiscoveredThing>> {
        if !self.config.resolve_links {
            return Ok(things);
        }

        let mut resolved = Vec::with_capacity(things.len());
        for thing in things {
            if thing.discovery_method != DiscoveryMethod::Directory {
                resolved.push(thing);
                continue;
            }
            match self.fetch_document(&thing.url, cancel).await {
                Ok(td) if td.is_object() => {
                    resolved.push(well_known::from_td(
                        &td,
                        &thing.url,
                        DiscoveryMethod::Directory,
                        ids,
                    ));
                }
                Ok(_) => {
                    errors.push(ScanFailure {
                        url: thing.url.clone(),
                        error: WotError::InvalidTd("linked document is not a JSON object".to_string())
                            .to_string(),
                    });
                    resolved.push(thing);
                }
                Err(WotError::Cancelled) => return Err(WotError::Cancelled),
                Err(e) => {
                    tracing::warn!("Resolving link {} failed: {}", thing.url, e);
                    errors.push(ScanFailure {
                        url: thing.url.clone(),
                        error: e.to_string(),
                    });
                    resolved.push(thing);
                }
            }
        }
        Ok(resolved)
    }

    async fn fetch_document(&self, url: &str, cancel: &CancellationToken) -> Result<Value> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WotError::Cancelled),
            response = self.http.get(url, self.config.request_timeout()) => response?,
        };

        if !response.is_success() {
            return Err(WotError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }

        let content_type = response.content_type.as_deref().unwrap_or_default();
        if !is_json_content_type(content_type) {
            return Err(WotError::ContentType {
                url: url.to_string(),
                content_type: if content_type.is_empty() {
                    "none".to_string()
                } else {
                    content_type.to_string()
                },
            });
        }

        Ok(serde_json::from_str(&response.body)?)
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    JSON_CONTENT_TYPES
        .iter()
        .any(|accepted| content_type.contains(accepted))
}

/// Validate a discovered thing's TD and record the outcome on it
pub fn apply_validation(thing: &mut DiscoveredThing) {
    match serde_json::to_string(&thing.thing_description) {
        Ok(text) => {
            let report = validator::validate(&text);
            thing.validation_status = if report.is_valid {
                ValidationStatus::Valid
            } else {
                ValidationStatus::Invalid
            };
            thing.validation_errors = report.errors;
        }
        Err(e) => {
            thing.validation_status = ValidationStatus::Warning;
            thing.validation_errors = vec![format!("Validation could not run: {}", e)];
        }
    }
}
