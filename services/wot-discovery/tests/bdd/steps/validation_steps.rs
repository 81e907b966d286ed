//! BDD step definitions for Thing Description validation

use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use wot_discovery::validator;

use crate::world::DiscoveryWorld;

#[given("the Thing Description")]
fn td_text(world: &mut DiscoveryWorld, step: &Step) {
    let text = step.docstring.as_deref().expect("step needs a doc string");
    world.td_text = Some(text.trim().to_string());
}

#[when("I validate it")]
fn validate_it(world: &mut DiscoveryWorld) {
    let text = world.td_text.as_deref().expect("no Thing Description given");
    world.validation = Some(validator::validate(text));
}

fn validation(world: &DiscoveryWorld) -> &wot_discovery::ValidationResult {
    world.validation.as_ref().expect("nothing validated")
}

#[then("it is valid")]
fn is_valid(world: &mut DiscoveryWorld) {
    let result = validation(world);
    assert!(result.is_valid, "unexpected errors: {:?}", result.errors);
}

#[then("it is invalid")]
fn is_invalid(world: &mut DiscoveryWorld) {
    assert!(!validation(world).is_valid);
}

#[then(expr = "the errors include {string}")]
fn errors_include(world: &mut DiscoveryWorld, message: String) {
    let errors = &validation(world).errors;
    assert!(errors.contains(&message), "errors were {:?}", errors);
}

#[then(expr = "the warnings include {string}")]
fn warnings_include(world: &mut DiscoveryWorld, message: String) {
    let warnings = &validation(world).warnings;
    assert!(warnings.contains(&message), "warnings were {:?}", warnings);
}

#[then("there are no warnings")]
fn no_warnings(world: &mut DiscoveryWorld) {
    assert!(validation(world).warnings.is_empty());
}

#[then("the security details are not valid")]
fn security_invalid(world: &mut DiscoveryWorld) {
    assert!(!validation(world).details.security_valid);
}
