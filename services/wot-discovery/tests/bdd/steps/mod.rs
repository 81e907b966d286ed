//! BDD step definitions for the discovery service

pub mod discovery_steps;
pub mod import_steps;
pub mod validation_steps;
