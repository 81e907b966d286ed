//! BDD step definitions for discovery scans

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};
use serde_json::{json, Value};

use wot_discovery::io::HttpResponse;
use wot_discovery::model::{DiscoveryMethod, ValidationStatus};
use wot_discovery::WotError;

use crate::world::DiscoveryWorld;

fn well_known(base_url: &str) -> String {
    format!("{}/.well-known/wot", base_url.trim_end_matches('/'))
}

fn valid_td(id: &str, title: &str) -> Value {
    json!({
        "@context": "https://www.w3.org/2019/wot/td/v1",
        "id": id,
        "title": title,
        "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
        "security": "nosec_sc",
        "properties": {
            "status": {"type": "string", "forms": [{"href": "/status"}]}
        }
    })
}

fn serve_json(world: &mut DiscoveryWorld, url: String, body: &Value) {
    world.http.responses.insert(
        url,
        HttpResponse {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.to_string(),
        },
    );
}

#[given(expr = "{string} serves a thing {string} titled {string}")]
fn serves_single_thing(world: &mut DiscoveryWorld, base_url: String, id: String, title: String) {
    serve_json(world, well_known(&base_url), &valid_td(&id, &title));
}

#[given(expr = "{string} serves {int} things")]
fn serves_many_things(world: &mut DiscoveryWorld, base_url: String, count: usize) {
    let tds: Vec<Value> = (0..count)
        .map(|i| valid_td(&format!("{}#thing-{}", base_url, i), &format!("Thing {}", i)))
        .collect();
    serve_json(world, well_known(&base_url), &Value::Array(tds));
}

#[given(expr = "{string} serves a thing without a context")]
fn serves_thing_without_context(world: &mut DiscoveryWorld, base_url: String) {
    serve_json(
        world,
        well_known(&base_url),
        &json!({"id": "urn:dev:bare", "title": "Bare"}),
    );
}

#[given(expr = "{string} serves a directory linking {string}")]
fn serves_directory(world: &mut DiscoveryWorld, base_url: String, href: String) {
    serve_json(
        world,
        well_known(&base_url),
        &json!({"links": [{"href": href, "title": "Linked"}]}),
    );
}

#[given(expr = "{string} serves a thing {string} titled {string} directly")]
fn serves_td_at(world: &mut DiscoveryWorld, url: String, id: String, title: String) {
    serve_json(world, url, &valid_td(&id, &title));
}

#[given(expr = "{string} answers with content type {string}")]
fn answers_with_content_type(world: &mut DiscoveryWorld, base_url: String, content_type: String) {
    world.http.responses.insert(
        well_known(&base_url),
        HttpResponse {
            status: 200,
            content_type: Some(content_type),
            body: "<html></html>".to_string(),
        },
    );
}

#[given(expr = "{string} never answers")]
fn never_answers(world: &mut DiscoveryWorld, base_url: String) {
    world.http.stalled.push(well_known(&base_url));
}

#[given("directory links are resolved")]
fn links_resolved(world: &mut DiscoveryWorld) {
    world.config.resolve_links = true;
}

#[given("the discovery service has been disposed")]
fn service_disposed(world: &mut DiscoveryWorld) {
    world.discovery().dispose();
}

fn urls(list: &str) -> Vec<String> {
    list.split(',').map(|url| url.trim().to_string()).collect()
}

#[when(expr = "I scan {string}")]
async fn scan(world: &mut DiscoveryWorld, list: String) {
    let discovery = world.discovery();
    world.outcome = Some(discovery.discover(&urls(&list)).await);
}

#[when(expr = "I scan {string} and cancel after {int} ms")]
async fn scan_and_cancel(world: &mut DiscoveryWorld, list: String, delay_ms: u64) {
    let discovery = world.discovery();
    let canceller = Arc::clone(&discovery);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        canceller.cancel();
    });
    world.outcome = Some(discovery.discover(&urls(&list)).await);
}

#[then(expr = "the scan completes with {int} discovered things")]
fn completes_with(world: &mut DiscoveryWorld, count: usize) {
    let outcome = world.result();
    assert!(!outcome.is_cancelled(), "scan was cancelled");
    assert_eq!(outcome.result().discovered.len(), count);
}

#[then(expr = "the scan is cancelled with {int} discovered things")]
fn cancelled_with(world: &mut DiscoveryWorld, count: usize) {
    let outcome = world.result();
    assert!(outcome.is_cancelled(), "scan was not cancelled");
    assert_eq!(outcome.result().discovered.len(), count);
}

#[then(expr = "{string} failed with {string}")]
fn url_failed_with(world: &mut DiscoveryWorld, url: String, message: String) {
    let errors = &world.result().result().errors;
    let failure = errors
        .iter()
        .find(|failure| failure.url == url)
        .unwrap_or_else(|| panic!("no failure recorded for {}: {:?}", url, errors));
    assert!(
        failure.error.contains(&message),
        "expected '{}' in '{}'",
        message,
        failure.error
    );
}

#[then("no scan errors are recorded")]
fn no_errors(world: &mut DiscoveryWorld) {
    assert!(world.result().result().errors.is_empty());
}

#[then(expr = "thing {string} is {word}")]
fn thing_has_status(world: &mut DiscoveryWorld, id: String, status: String) {
    let thing = world
        .result()
        .result()
        .discovered
        .iter()
        .find(|thing| thing.id == id)
        .unwrap_or_else(|| panic!("thing {} not discovered", id));
    let expected = match status.as_str() {
        "valid" => ValidationStatus::Valid,
        "invalid" => ValidationStatus::Invalid,
        "warning" => ValidationStatus::Warning,
        "pending" => ValidationStatus::Pending,
        other => panic!("unknown status {}", other),
    };
    assert_eq!(thing.validation_status, expected);
}

#[then(expr = "every discovered thing came from the directory at {string}")]
fn from_directory(world: &mut DiscoveryWorld, url: String) {
    let discovered = &world.result().result().discovered;
    assert!(!discovered.is_empty());
    for thing in discovered {
        assert_eq!(thing.discovery_method, DiscoveryMethod::Directory);
        assert_eq!(thing.url, url);
    }
}

#[then(expr = "{int} endpoints are registered")]
async fn endpoints_registered(world: &mut DiscoveryWorld, count: usize) {
    let state = world.state.as_ref().expect("state not created");
    assert_eq!(state.read().await.endpoints.len(), count);
}

#[then("the scan is refused because the service is disposed")]
fn refused_disposed(world: &mut DiscoveryWorld) {
    match world.outcome.as_ref() {
        Some(Err(WotError::Disposed)) => {}
        other => panic!("expected Disposed, got {:?}", other),
    }
}
