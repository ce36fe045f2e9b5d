//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::rules::Strategy;

/// Root configuration for the dispatch engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend endpoints registered at startup.
    pub endpoints: Vec<EndpointConfig>,

    /// Category -> routing rule definitions.
    pub rules: Vec<RuleConfig>,

    /// Rule applied to categories without an entry in `rules`.
    pub default_rule: DefaultRuleConfig,

    /// Scoring weights and telemetry adjustment steps.
    pub scoring: ScoringConfig,

    /// Periodic health sweep settings.
    pub health_check: HealthCheckConfig,

    /// Backoff between retry attempts.
    pub retries: RetryConfig,

    /// Execution history retention.
    pub history: HistoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            rules: builtin_rules(),
            default_rule: DefaultRuleConfig::default(),
            scoring: ScoringConfig::default(),
            health_check: HealthCheckConfig::default(),
            retries: RetryConfig::default(),
            history: HistoryConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Backend endpoint definition.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Explicit identifier. Derived from service type and address when absent.
    #[serde(default)]
    pub id: Option<String>,

    /// Logical backend kind (e.g. "gpt-4o").
    pub service_type: String,

    /// Connection address, opaque to the router.
    pub address: String,

    /// Credential reference handed to the executor, opaque to the router.
    #[serde(default)]
    pub credential_ref: Option<String>,

    /// Maximum concurrent in-flight requests.
    #[serde(default = "default_max_load")]
    pub max_load: u32,
}

fn default_max_load() -> u32 {
    100
}

/// Routing rule definition for one request category.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Request category (intent) this rule applies to.
    pub category: String,

    /// Selection strategy.
    pub strategy: Strategy,

    /// Service types searched in order for eligible endpoints.
    #[serde(default)]
    pub preferred_service_types: Vec<String>,

    /// Per-attempt downstream call deadline.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Additional attempts after the first failure.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Batch size reported on `batch` results.
    #[serde(default)]
    pub batch_size: Option<usize>,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_count() -> u32 {
    1
}

/// Fallback rule parameters for unknown categories.
///
/// The preferred service type list is taken from the request itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultRuleConfig {
    pub strategy: Strategy,
    pub timeout_ms: u64,
    pub retry_count: u32,
}

impl Default for DefaultRuleConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Direct,
            timeout_ms: default_timeout_ms(),
            retry_count: default_retry_count(),
        }
    }
}

/// Scoring weights and telemetry adjustment steps.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of `health_score` in the adaptive score.
    pub health_weight: f64,
    /// Weight of `1 - load_factor` in the adaptive score.
    pub load_weight: f64,
    /// Weight of the request compatibility score.
    pub compatibility_weight: f64,
    /// Weight of the response time factor.
    pub response_time_weight: f64,
    /// Flat bonus when the category has affinity with the service type.
    pub intent_bonus: f64,
    /// Compatibility assumed when the request carries none.
    pub default_compatibility: f64,
    /// Latency at which the response time factor reaches zero.
    pub response_time_reference_ms: f64,

    /// Success rate increase per successful dispatch.
    pub success_step: f64,
    /// Success rate decrease per failed dispatch.
    pub failure_step: f64,
    /// Health increase per successful probe.
    pub sweep_recovery_step: f64,
    /// Health decrease per failed probe.
    pub sweep_penalty_step: f64,

    /// Endpoints at or below this health are not eligible.
    pub eligibility_threshold: f64,

    /// Category -> service types that earn the intent bonus.
    pub intent_affinity: BTreeMap<String, Vec<String>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut intent_affinity = BTreeMap::new();
        intent_affinity.insert(
            "security".to_string(),
            vec!["gpt-4o".to_string(), "claude-3".to_string()],
        );
        intent_affinity.insert("debug".to_string(), vec!["github-copilot".to_string()]);

        Self {
            health_weight: 0.4,
            load_weight: 0.3,
            compatibility_weight: 0.2,
            response_time_weight: 0.1,
            intent_bonus: 0.2,
            default_compatibility: 0.7,
            response_time_reference_ms: 10_000.0,
            success_step: 0.01,
            failure_step: 0.05,
            sweep_recovery_step: 0.05,
            sweep_penalty_step: 0.1,
            eligibility_threshold: 0.5,
            intent_affinity,
        }
    }
}

/// How the health sweep probes endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// Every probe succeeds; the sweep only drifts health upwards.
    AssumeHealthy,
    /// HTTP GET against `address + path`.
    Http,
}

/// Health sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the periodic sweep.
    pub enabled: bool,

    /// Sweep interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Probe implementation.
    pub probe: ProbeMode,

    /// Path appended to the endpoint address for HTTP probes.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_secs: 5,
            probe: ProbeMode::AssumeHealthy,
            path: "/health".to_string(),
        }
    }
}

/// Retry backoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay for exponential backoff in milliseconds. Zero retries immediately.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 0,
            max_delay_ms: 2000,
        }
    }
}

/// Execution history retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum execution records kept in memory.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

fn rule(
    category: &str,
    strategy: Strategy,
    preferred: &[&str],
    timeout_secs: u64,
    retry_count: u32,
) -> RuleConfig {
    RuleConfig {
        category: category.to_string(),
        strategy,
        preferred_service_types: preferred.iter().map(|s| s.to_string()).collect(),
        timeout_ms: timeout_secs * 1000,
        retry_count,
        batch_size: None,
    }
}

/// The built-in category table used when no rules are configured.
pub fn builtin_rules() -> Vec<RuleConfig> {
    vec![
        rule("security", Strategy::Direct, &["gpt-4o", "claude-3"], 60, 3),
        rule("debug", Strategy::Failover, &["github-copilot", "gpt-4o"], 45, 2),
        rule("refactor", Strategy::LoadBalanced, &["gpt-4o", "github-copilot"], 30, 2),
        rule("analyze", Strategy::Adaptive, &["gpt-4o", "claude-3"], 45, 2),
        rule("generate", Strategy::Batch, &["github-copilot", "gpt-4o"], 60, 1),
        rule("optimize", Strategy::Streaming, &["gpt-4o", "github-copilot"], 90, 2),
    ]
}
