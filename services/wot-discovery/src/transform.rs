//! Conversion of discovered Thing Descriptions into application Things

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::model::{
    DiscoveredThing, Thing, ThingAction, ThingCategory, ThingEvent, ThingProperty, ThingStatus,
};

/// Ordered keyword table; the first keyword found in any `@type` entry wins
const CATEGORY_KEYWORDS: [(&[&str], ThingCategory); 6] = [
    (&["sensor"], ThingCategory::Sensor),
    (&["actuator"], ThingCategory::Actuator),
    (&["light"], ThingCategory::Light),
    (&["thermostat", "temperature"], ThingCategory::Thermostat),
    (&["camera", "video"], ThingCategory::Camera),
    (&["motor", "pump"], ThingCategory::Motor),
];

/// Build a [`Thing`] from a discovered TD
pub fn transform(discovered: &DiscoveredThing) -> Thing {
    let td = &discovered.thing_description;
    let now = Utc::now();
    let types = td_types(td);

    Thing {
        id: discovered.id.clone(),
        title: discovered.title.clone(),
        description: discovered.description.clone(),
        url: discovered.url.clone(),
        status: if discovered.online {
            ThingStatus::Online
        } else {
            ThingStatus::Unknown
        },
        last_seen: discovered.last_seen,
        discovery_method: discovered.discovery_method,
        validation_status: discovered.validation_status,
        thing_description: td.clone(),
        properties: extract_properties(td, now),
        actions: extract_actions(td),
        events: extract_events(td),
        tags: extract_tags(td, &types),
        category: categorize(&types),
    }
}

/// String entries of `@type`, accepting a bare string as a one-element list
pub fn td_types(td: &Value) -> Vec<String> {
    match td.get("@type") {
        Some(Value::String(t)) => vec![t.clone()],
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// First matching category for a list of `@type` entries
pub fn categorize(types: &[String]) -> ThingCategory {
    let lowered: Vec<String> = types.iter().map(|t| t.to_lowercase()).collect();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keywords, _)| {
            keywords
                .iter()
                .any(|keyword| lowered.iter().any(|t| t.contains(keyword)))
        })
        .map(|(_, category)| *category)
        .unwrap_or(ThingCategory::Other)
}

fn affordances<'a>(td: &'a Value, key: &str) -> impl Iterator<Item = (&'a String, &'a Value)> {
    td.get(key)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.iter())
}

fn display_name(id: &str, affordance: &Value) -> String {
    affordance
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or(id)
        .to_string()
}

fn text(affordance: &Value, key: &str) -> Option<String> {
    affordance.get(key).and_then(Value::as_str).map(str::to_string)
}

fn flag(affordance: &Value, key: &str) -> bool {
    affordance.get(key).and_then(Value::as_bool) == Some(true)
}

fn extract_properties(td: &Value, now: DateTime<Utc>) -> Vec<ThingProperty> {
    affordances(td, "properties")
        .map(|(id, property)| ThingProperty {
            id: id.clone(),
            name: display_name(id, property),
            data_type: text(property, "type").unwrap_or_else(|| "string".to_string()),
            description: text(property, "description"),
            unit: text(property, "unit"),
            value: None,
            last_updated: now,
            writable: !flag(property, "writeOnly"),
            observable: flag(property, "observable"),
        })
        .collect()
}

fn extract_actions(td: &Value) -> Vec<ThingAction> {
    affordances(td, "actions")
        .map(|(id, action)| ThingAction {
            id: id.clone(),
            name: display_name(id, action),
            description: text(action, "description"),
            input: action.get("input").cloned(),
            output: action.get("output").cloned(),
            safe: flag(action, "safe"),
            idempotent: flag(action, "idempotent"),
        })
        .collect()
}

fn extract_events(td: &Value) -> Vec<ThingEvent> {
    affordances(td, "events")
        .map(|(id, event)| ThingEvent {
            id: id.clone(),
            name: display_name(id, event),
            description: text(event, "description"),
            data: event.get("data").cloned(),
        })
        .collect()
}

fn extract_tags(td: &Value, types: &[String]) -> Vec<String> {
    let schemes = td
        .get("securityDefinitions")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.keys())
        .map(|scheme| format!("security:{}", scheme));
    types.iter().cloned().chain(schemes).collect()
}
