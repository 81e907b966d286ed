//! BDD step definitions for importing discovered things

use chrono::Utc;
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use serde_json::Value;

use wot_discovery::model::{DiscoveryMethod, ThingCategory, ThingStatus, ValidationStatus};
use wot_discovery::transform::transform;
use wot_discovery::DiscoveredThing;

use crate::world::DiscoveryWorld;

#[given(expr = "a discovered thing {string} with the Thing Description")]
fn discovered_with_td(world: &mut DiscoveryWorld, id: String, step: &Step) {
    let text = step.docstring.as_deref().expect("step needs a doc string");
    let td: Value = serde_json::from_str(text.trim()).expect("doc string is not JSON");
    let title = td
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("Untitled Thing")
        .to_string();
    world.discovered = Some(DiscoveredThing {
        id,
        url: "http://things.local".to_string(),
        thing_description: td,
        title,
        description: None,
        discovery_method: DiscoveryMethod::WellKnown,
        last_seen: Utc::now(),
        online: true,
        validation_status: ValidationStatus::Valid,
        validation_errors: Vec::new(),
    });
}

#[when("I import it")]
fn import_it(world: &mut DiscoveryWorld) {
    let discovered = world.discovered.as_ref().expect("no discovered thing");
    world.thing = Some(transform(discovered));
}

fn imported(world: &DiscoveryWorld) -> &wot_discovery::Thing {
    world.thing.as_ref().expect("nothing imported")
}

#[then(expr = "the thing has id {string}")]
fn has_id(world: &mut DiscoveryWorld, id: String) {
    assert_eq!(imported(world).id, id);
}

#[then(expr = "the thing is categorized as {word}")]
fn categorized(world: &mut DiscoveryWorld, category: String) {
    let expected = match category.as_str() {
        "sensor" => ThingCategory::Sensor,
        "actuator" => ThingCategory::Actuator,
        "light" => ThingCategory::Light,
        "thermostat" => ThingCategory::Thermostat,
        "camera" => ThingCategory::Camera,
        "motor" => ThingCategory::Motor,
        "other" => ThingCategory::Other,
        other => panic!("unknown category {}", other),
    };
    assert_eq!(imported(world).category, expected);
}

#[then(expr = "the thing has {int} properties, {int} actions and {int} events")]
fn affordance_counts(world: &mut DiscoveryWorld, properties: usize, actions: usize, events: usize) {
    let thing = imported(world);
    assert_eq!(thing.properties.len(), properties);
    assert_eq!(thing.actions.len(), actions);
    assert_eq!(thing.events.len(), events);
}

#[then(expr = "property {string} is not writable")]
fn property_not_writable(world: &mut DiscoveryWorld, id: String) {
    let property = imported(world)
        .properties
        .iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| panic!("no property {}", id));
    assert!(!property.writable);
}

#[then(expr = "the thing is tagged {string}")]
fn tagged(world: &mut DiscoveryWorld, tag: String) {
    let tags = &imported(world).tags;
    assert!(tags.contains(&tag), "tags were {:?}", tags);
}

#[then("the thing is online")]
fn online(world: &mut DiscoveryWorld) {
    assert_eq!(imported(world).status, ThingStatus::Online);
}
