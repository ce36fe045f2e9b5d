//! Category → routing rule lookup.
//!
//! # Responsibilities
//! - Store the compiled rules, keyed by request category
//! - Return the matching rule, or a default rule built from the request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Unknown categories are not an error; they fall back to the default rule
//! - Reload replaces the whole table atomically

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{DefaultRuleConfig, RuleConfig};
use crate::dispatch::DispatchRequest;
use crate::registry::ServiceType;

/// Batch size reported when a batch rule does not set one.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Endpoint selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Direct,
    LoadBalanced,
    Failover,
    Adaptive,
    Batch,
    Streaming,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::LoadBalanced => "load_balanced",
            Strategy::Failover => "failover",
            Strategy::Adaptive => "adaptive",
            Strategy::Batch => "batch",
            Strategy::Streaming => "streaming",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How requests of one category are routed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingRule {
    pub category: String,
    pub strategy: Strategy,
    pub preferred_service_types: Vec<ServiceType>,
    pub timeout_ms: u64,
    pub retry_count: u32,
    pub batch_size: usize,
}

impl RoutingRule {
    /// Per-attempt deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl From<&RuleConfig> for RoutingRule {
    fn from(config: &RuleConfig) -> Self {
        Self {
            category: config.category.clone(),
            strategy: config.strategy,
            preferred_service_types: config
                .preferred_service_types
                .iter()
                .map(|s| ServiceType::new(s.clone()))
                .collect(),
            timeout_ms: config.timeout_ms,
            retry_count: config.retry_count,
            batch_size: config.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
        }
    }
}

/// Immutable category → rule table.
#[derive(Debug, Clone)]
pub struct RoutingRuleTable {
    rules: HashMap<String, RoutingRule>,
    default: DefaultRuleConfig,
}

impl RoutingRuleTable {
    /// Compile a table. Later duplicates of a category replace earlier ones.
    pub fn new(rules: &[RuleConfig], default: DefaultRuleConfig) -> Self {
        let rules = rules
            .iter()
            .map(|r| (r.category.clone(), RoutingRule::from(r)))
            .collect();
        Self { rules, default }
    }

    /// Configured rule for a category.
    pub fn get(&self, category: &str) -> Option<&RoutingRule> {
        self.rules.get(category)
    }

    /// Rule for a request: configured, or the default rule targeting the
    /// request's own service type.
    pub fn lookup(&self, request: &DispatchRequest) -> RoutingRule {
        match self.rules.get(&request.category) {
            Some(rule) => rule.clone(),
            None => {
                tracing::warn!(
                    request_id = %request.request_id,
                    category = %request.category,
                    "Unknown category, falling back to default rule"
                );
                self.default_rule(&request.category, request.target_service_type.as_ref())
            }
        }
    }

    /// Default rule for an unconfigured category.
    pub fn default_rule(&self, category: &str, target: Option<&ServiceType>) -> RoutingRule {
        RoutingRule {
            category: category.to_string(),
            strategy: self.default.strategy,
            preferred_service_types: target.cloned().into_iter().collect(),
            timeout_ms: self.default.timeout_ms,
            retry_count: self.default.retry_count,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Configured rules sorted by category.
    pub fn rules(&self) -> Vec<&RoutingRule> {
        let mut rules: Vec<_> = self.rules.values().collect();
        rules.sort_by(|a, b| a.category.cmp(&b.category));
        rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
