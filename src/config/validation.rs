//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Detect duplicate endpoint ids and rule categories
//! - Validate value ranges (timeouts > 0, weights within [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{EndpointConfig, EngineConfig, ScoringConfig};
use crate::registry::EndpointId;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("endpoint #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("endpoint {id} has max_load 0")]
    ZeroMaxLoad { id: String },

    #[error("duplicate endpoint id {0}")]
    DuplicateEndpoint(String),

    #[error("duplicate rule for category {0}")]
    DuplicateCategory(String),

    #[error("rule {category} has timeout_ms 0")]
    ZeroTimeout { category: String },

    #[error("scoring.{field} = {value} is outside [0, 1]")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("admin.api_key must be set when the admin API is enabled")]
    EmptyApiKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_endpoints(&config.endpoints, &mut errors);

    let mut categories = HashSet::new();
    for rule in &config.rules {
        if !categories.insert(rule.category.as_str()) {
            errors.push(ValidationError::DuplicateCategory(rule.category.clone()));
        }
        if rule.timeout_ms == 0 {
            errors.push(ValidationError::ZeroTimeout {
                category: rule.category.clone(),
            });
        }
    }
    if config.default_rule.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout {
            category: "<default>".to_string(),
        });
    }

    validate_scoring(&config.scoring, &mut errors);

    if config.history.capacity == 0 {
        errors.push(ValidationError::NonPositive("history.capacity"));
    }
    if config.health_check.enabled && config.health_check.interval_secs == 0 {
        errors.push(ValidationError::NonPositive("health_check.interval_secs"));
    }
    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::EmptyApiKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoints(endpoints: &[EndpointConfig], errors: &mut Vec<ValidationError>) {
    let mut ids = HashSet::new();
    for (index, endpoint) in endpoints.iter().enumerate() {
        if endpoint.service_type.trim().is_empty() {
            errors.push(ValidationError::EmptyField { index, field: "service_type" });
        }
        if endpoint.address.trim().is_empty() {
            errors.push(ValidationError::EmptyField { index, field: "address" });
        }

        let id = EndpointId::for_config(endpoint);
        if endpoint.max_load == 0 {
            errors.push(ValidationError::ZeroMaxLoad { id: id.to_string() });
        }
        if !ids.insert(id.clone()) {
            errors.push(ValidationError::DuplicateEndpoint(id.to_string()));
        }
    }
}

fn validate_scoring(scoring: &ScoringConfig, errors: &mut Vec<ValidationError>) {
    let unit_fields = [
        ("health_weight", scoring.health_weight),
        ("load_weight", scoring.load_weight),
        ("compatibility_weight", scoring.compatibility_weight),
        ("response_time_weight", scoring.response_time_weight),
        ("intent_bonus", scoring.intent_bonus),
        ("default_compatibility", scoring.default_compatibility),
        ("success_step", scoring.success_step),
        ("failure_step", scoring.failure_step),
        ("sweep_recovery_step", scoring.sweep_recovery_step),
        ("sweep_penalty_step", scoring.sweep_penalty_step),
        ("eligibility_threshold", scoring.eligibility_threshold),
    ];
    for (field, value) in unit_fields {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::OutOfRange { field, value });
        }
    }
    if scoring.response_time_reference_ms <= 0.0 {
        errors.push(ValidationError::NonPositive("scoring.response_time_reference_ms"));
    }
}
