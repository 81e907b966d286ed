//! Interpretation of `/.well-known/wot` responses
//!
//! A well-known endpoint may answer with a single Thing Description, an
//! array of them, or a directory object listing links to TDs. All three are
//! turned into [`DiscoveredThing`] records awaiting validation.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use reqwest::Url;
use serde_json::{json, Map, Value};

use crate::error::{Result, WotError};
use crate::model::{DiscoveredThing, DiscoveryMethod, ValidationStatus};

/// Path every base URL is rewritten to when scanning
pub const WELL_KNOWN_PATH: &str = "/.well-known/wot";

const UNTITLED: &str = "Untitled Thing";

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

/// Build the well-known URL for a base URL, replacing its path
pub fn well_known_url(base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| WotError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(WotError::InvalidUrl(base_url.to_string()));
    }
    url.set_path(WELL_KNOWN_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Lowercase `title` and collapse every run of non-alphanumerics into `-`
pub fn slugify(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = NON_ALPHANUMERIC.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "thing".to_string()
    } else {
        slug.to_string()
    }
}

/// Hands out thing ids for one discovery run
///
/// Explicit `id` / `@id` values are used as-is. Otherwise the id is the
/// slugified title plus a millisecond stamp that never repeats within the
/// generator's lifetime, even when two things arrive in the same millisecond.
#[derive(Debug, Default)]
pub struct ThingIdGenerator {
    last_stamp: i64,
}

impl ThingIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thing_id(&mut self, td: &Value, title: &str) -> String {
        explicit_id(td).unwrap_or_else(|| format!("{}-{}", slugify(title), self.next_stamp()))
    }

    fn next_stamp(&mut self) -> i64 {
        let stamp = Utc::now().timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }
}

fn explicit_id(td: &Value) -> Option<String> {
    ["id", "@id"]
        .iter()
        .filter_map(|key| td.get(*key).and_then(Value::as_str))
        .find(|id| !id.is_empty())
        .map(str::to_string)
}

/// Parse a well-known response body with a fresh id generator
pub fn parse(body: &Value, base_url: &str) -> Result<Vec<DiscoveredThing>> {
    parse_well_known(body, base_url, &mut ThingIdGenerator::new())
}

/// Parse a well-known response body into discovered things
pub fn parse_well_known(
    body: &Value,
    base_url: &str,
    ids: &mut ThingIdGenerator,
) -> Result<Vec<DiscoveredThing>> {
    match body {
        Value::Object(object) if looks_like_td(object) => {
            Ok(vec![from_td(body, base_url, DiscoveryMethod::WellKnown, ids)])
        }
        Value::Array(entries) => Ok(entries
            .iter()
            .filter(|entry| entry.is_object())
            .map(|td| from_td(td, base_url, DiscoveryMethod::WellKnown, ids))
            .collect()),
        Value::Object(object) => {
            let links = ["things", "links"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_array))
                .ok_or_else(|| {
                    WotError::Parse(
                        "expected a Thing Description, an array, or a things/links directory"
                            .to_string(),
                    )
                })?;
            parse_directory(links, base_url, ids)
        }
        other => Err(WotError::Parse(format!(
            "unexpected {} at top level",
            json_kind(other)
        ))),
    }
}

fn looks_like_td(object: &Map<String, Value>) -> bool {
    object.contains_key("@type") || object.contains_key("title")
}

fn parse_directory(
    links: &[Value],
    base_url: &str,
    ids: &mut ThingIdGenerator,
) -> Result<Vec<DiscoveredThing>> {
    let base = Url::parse(base_url).map_err(|e| WotError::Parse(format!("{}: {}", base_url, e)))?;

    let mut things = Vec::new();
    for entry in links {
        let Some(href) = entry.get("href").and_then(Value::as_str) else {
            continue;
        };
        let url = base
            .join(href)
            .map_err(|e| WotError::Parse(format!("invalid href '{}': {}", href, e)))?;
        let title = entry
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(href)
            .to_string();
        let stub = json!({ "title": title, "href": href });

        things.push(DiscoveredThing {
            id: ids.thing_id(entry, &title),
            url: url.to_string(),
            thing_description: stub,
            title,
            description: None,
            discovery_method: DiscoveryMethod::Directory,
            last_seen: Utc::now(),
            online: false,
            validation_status: ValidationStatus::Pending,
            validation_errors: Vec::new(),
        });
    }
    Ok(things)
}

/// Wrap a full Thing Description found at `url`
pub fn from_td(
    td: &Value,
    url: &str,
    method: DiscoveryMethod,
    ids: &mut ThingIdGenerator,
) -> DiscoveredThing {
    let title = td
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(UNTITLED)
        .to_string();
    let description = td
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    DiscoveredThing {
        id: ids.thing_id(td, &title),
        url: url.to_string(),
        thing_description: td.clone(),
        title,
        description,
        discovery_method: method,
        last_seen: Utc::now(),
        online: true,
        validation_status: ValidationStatus::Pending,
        validation_errors: Vec::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
