//! Discovery records, validation results and application Thing records

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a Thing Description was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryMethod {
    /// Served by a `/.well-known/wot` endpoint
    WellKnown,
    /// Link listed by a `/.well-known/wot` directory, possibly unresolved
    Directory,
    /// Fetched from a TD URL given directly
    Direct,
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryMethod::WellKnown => write!(f, "well-known"),
            DiscoveryMethod::Directory => write!(f, "directory"),
            DiscoveryMethod::Direct => write!(f, "direct"),
        }
    }
}

/// Validation state of a discovered thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pending,
    Valid,
    Invalid,
    Warning,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Pending => write!(f, "pending"),
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::Invalid => write!(f, "invalid"),
            ValidationStatus::Warning => write!(f, "warning"),
        }
    }
}

/// A Thing Description found during a discovery run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredThing {
    pub id: String,
    pub url: String,
    pub thing_description: Value,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub discovery_method: DiscoveryMethod,
    pub last_seen: DateTime<Utc>,
    pub online: bool,
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub validation_errors: Vec<String>,
}

/// Which validation checks passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDetails {
    pub context_valid: bool,
    pub required_fields_present: bool,
    pub schema_valid: bool,
    pub security_valid: bool,
    pub links_valid: bool,
    pub forms_valid: bool,
}

/// Outcome of validating one Thing Description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub details: ValidationDetails,
}

/// Phase of a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryPhase {
    Scanning,
    Validating,
    Completed,
}

/// Progress report handed to the caller as a run advances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryProgress {
    pub total: usize,
    pub completed: usize,
    pub current: Option<String>,
    pub status: DiscoveryPhase,
}

/// A base URL that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub url: String,
    pub error: String,
}

/// Things found by a run together with the per-URL failures
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub discovered: Vec<DiscoveredThing>,
    pub errors: Vec<ScanFailure>,
}

/// How a discovery run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DiscoveryOutcome {
    Completed(DiscoveryResult),
    /// Stopped early; holds whatever was accumulated before cancellation
    Cancelled(DiscoveryResult),
}

impl DiscoveryOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DiscoveryOutcome::Cancelled(_))
    }

    pub fn result(&self) -> &DiscoveryResult {
        match self {
            DiscoveryOutcome::Completed(result) | DiscoveryOutcome::Cancelled(result) => result,
        }
    }
}

/// Connectivity of an imported thing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThingStatus {
    Online,
    Unknown,
}

impl fmt::Display for ThingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThingStatus::Online => write!(f, "online"),
            ThingStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Coarse device class derived from a TD's `@type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThingCategory {
    Sensor,
    Actuator,
    Light,
    Thermostat,
    Camera,
    Motor,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingProperty {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Seeded empty; live values come from a monitoring source after import
    pub value: Option<Value>,
    pub last_updated: DateTime<Utc>,
    pub writable: bool,
    pub observable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingAction {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub safe: bool,
    pub idempotent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingEvent {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Application record for an imported thing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    pub status: ThingStatus,
    pub last_seen: DateTime<Utc>,
    pub discovery_method: DiscoveryMethod,
    pub validation_status: ValidationStatus,
    pub thing_description: Value,
    pub properties: Vec<ThingProperty>,
    pub actions: Vec<ThingAction>,
    pub events: Vec<ThingEvent>,
    pub tags: Vec<String>,
    pub category: ThingCategory,
}

/// A base URL recognised as serving Thing Descriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryEndpoint {
    pub url: String,
    pub thing_count: usize,
    pub last_scan: DateTime<Utc>,
}
