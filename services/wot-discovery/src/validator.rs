//! Thing Description validation
//!
//! Checks a TD against the W3C WoT Thing Description rules that matter for
//! onboarding a device: the JSON-LD context, mandatory fields, security
//! declarations, form bindings and a few schema sanity checks. Problems are
//! reported, never raised: every input produces a [`ValidationResult`].

use serde_json::{Map, Value};

use crate::model::{ValidationDetails, ValidationResult};

/// Context URI every WoT TD 1.0 document must declare
pub const TD_CONTEXT_V1: &str = "https://www.w3.org/2019/wot/td/v1";

const AFFORDANCES: [(&str, &str); 3] = [
    ("properties", "Property"),
    ("actions", "Action"),
    ("events", "Event"),
];

/// Validate raw TD text
pub fn validate(td_json_text: &str) -> ValidationResult {
    match serde_json::from_str::<Value>(td_json_text) {
        Ok(td) => validate_value(&td),
        Err(e) => rejected(format!("Invalid JSON: {}", e)),
    }
}

/// Validate an already parsed TD
pub fn validate_value(td: &Value) -> ValidationResult {
    let Some(td) = td.as_object() else {
        return rejected("Thing Description must be a JSON object".to_string());
    };

    let mut report = Report::default();

    let context_ok = check_context(td, &mut report);
    let title_ok = check_title(td, &mut report);
    let security_ok = check_security(td, &mut report);
    check_capabilities(td, &mut report);
    let forms_ok = check_forms(td, &mut report);
    let schema_ok = check_schema(td, &mut report);

    let details = ValidationDetails {
        context_valid: context_ok,
        required_fields_present: context_ok && title_ok,
        schema_valid: schema_ok,
        security_valid: security_ok,
        links_valid: true,
        forms_valid: forms_ok,
    };

    ValidationResult {
        is_valid: report.errors.is_empty(),
        errors: report.errors,
        warnings: report.warnings,
        details,
    }
}

fn rejected(error: String) -> ValidationResult {
    ValidationResult {
        is_valid: false,
        errors: vec![error],
        warnings: Vec::new(),
        details: ValidationDetails::default(),
    }
}

#[derive(Default)]
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Report {
    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

fn check_context(td: &Map<String, Value>, report: &mut Report) -> bool {
    match td.get("@context") {
        None => {
            report.error("Missing required field: @context".to_string());
            false
        }
        Some(Value::Array(entries)) => {
            let has_td_context = entries
                .iter()
                .any(|entry| entry.as_str() == Some(TD_CONTEXT_V1));
            if !has_td_context {
                report.error(format!("@context must include {}", TD_CONTEXT_V1));
            }
            has_td_context
        }
        Some(_) => true,
    }
}

fn check_title(td: &Map<String, Value>, report: &mut Report) -> bool {
    match td.get("title") {
        None => {
            report.error("Missing required field: title".to_string());
            false
        }
        Some(Value::String(_)) => true,
        Some(_) => {
            report.error("title must be a string".to_string());
            false
        }
    }
}

fn check_security(td: &Map<String, Value>, report: &mut Report) -> bool {
    let has_definitions = td.contains_key("securityDefinitions");
    let has_security = td.contains_key("security");
    if !has_definitions {
        report.warn("Missing securityDefinitions".to_string());
    }
    if !has_security {
        report.warn("Missing security".to_string());
    }
    has_definitions && has_security
}

fn check_capabilities(td: &Map<String, Value>, report: &mut Report) {
    let has_any = AFFORDANCES.iter().any(|(key, _)| {
        td.get(*key)
            .and_then(Value::as_object)
            .is_some_and(|affordances| !affordances.is_empty())
    });
    if !has_any {
        report.warn("Thing has no properties, actions, or events".to_string());
    }
}

fn check_forms(td: &Map<String, Value>, report: &mut Report) -> bool {
    let mut ok = true;
    for (key, kind) in AFFORDANCES {
        let Some(affordances) = td.get(key).and_then(Value::as_object) else {
            continue;
        };
        for (name, affordance) in affordances {
            let Some(affordance) = affordance.as_object() else {
                continue;
            };
            match affordance.get("forms") {
                None => report.warn(format!("{} '{}' has no forms", kind, name)),
                Some(Value::Array(forms)) => {
                    for (index, form) in forms.iter().enumerate() {
                        let has_href = form.get("href").is_some_and(Value::is_string);
                        if !has_href {
                            report.error(format!(
                                "{} '{}' form {} is missing href",
                                kind, name, index
                            ));
                            ok = false;
                        }
                    }
                }
                Some(_) => {
                    report.error(format!("{} '{}' forms must be an array", kind, name));
                    ok = false;
                }
            }
        }
    }
    ok
}

fn check_schema(td: &Map<String, Value>, report: &mut Report) -> bool {
    let mut ok = true;

    if let Some(properties) = td.get("properties").and_then(Value::as_object) {
        for (name, property) in properties {
            let numeric = matches!(
                property.get("type").and_then(Value::as_str),
                Some("number") | Some("integer")
            );
            if !numeric {
                continue;
            }
            let minimum = property.get("minimum").and_then(Value::as_f64);
            let maximum = property.get("maximum").and_then(Value::as_f64);
            if let (Some(minimum), Some(maximum)) = (minimum, maximum) {
                if minimum > maximum {
                    report.error(format!(
                        "Property '{}' has minimum greater than maximum",
                        name
                    ));
                    ok = false;
                }
            }
        }
    }

    if let Some(actions) = td.get("actions").and_then(Value::as_object) {
        for (name, action) in actions {
            let Some(input) = action.get("input") else {
                continue;
            };
            let Some(required) = input.get("required").and_then(Value::as_array) else {
                continue;
            };
            let declared = input.get("properties").and_then(Value::as_object);
            for field in required.iter().filter_map(Value::as_str) {
                if !declared.is_some_and(|props| props.contains_key(field)) {
                    report.error(format!(
                        "Action '{}' input requires '{}' which is not defined in input.properties",
                        name, field
                    ));
                    ok = false;
                }
            }
        }
    }

    ok
}
