use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::admin::AdminState;
use crate::config::EndpointConfig;
use crate::dispatch::{DispatchRequest, RoutingResult};
use crate::history::{ExecutionRecord, RoutingStats};
use crate::registry::{Endpoint, EndpointSnapshot, RegistryError};
use crate::routing::RoutingRule;

const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Error body returned by the admin API.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DuplicateEndpoint(_) => Self::new(StatusCode::CONFLICT, e.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: usize,
    pub healthy_endpoints: usize,
    pub rules: usize,
    pub history_len: usize,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let registry = state.dispatcher.registry();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        endpoints: registry.len(),
        healthy_endpoints: registry.healthy_count(),
        rules: state.dispatcher.rules().len(),
        history_len: state.dispatcher.recorder().len(),
    })
}

pub async fn get_endpoints(State(state): State<AdminState>) -> Json<Vec<EndpointSnapshot>> {
    Json(state.dispatcher.registry().all())
}

pub async fn register_endpoint(
    State(state): State<AdminState>,
    Json(config): Json<EndpointConfig>,
) -> Result<(StatusCode, Json<EndpointSnapshot>), ApiError> {
    if config.service_type.trim().is_empty() || config.address.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "service_type and address must not be empty",
        ));
    }
    if config.max_load == 0 {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "max_load must be positive"));
    }

    let endpoint = Endpoint::from_config(&config);
    let snapshot = endpoint.snapshot();
    state.dispatcher.registry().register(endpoint)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn deregister_endpoint(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.dispatcher.registry().deregister(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("endpoint {} is not registered", id),
        ))
    }
}

pub async fn get_stats(State(state): State<AdminState>) -> Json<RoutingStats> {
    let dispatcher = &state.dispatcher;
    Json(dispatcher.recorder().get_stats(dispatcher.registry()))
}

pub async fn get_history(
    State(state): State<AdminState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<ExecutionRecord>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Json(state.dispatcher.recorder().recent(limit))
}

pub async fn get_rules(State(state): State<AdminState>) -> Json<Vec<RoutingRule>> {
    let table = state.dispatcher.rules();
    Json(table.rules().into_iter().cloned().collect())
}

/// Dispatch a request descriptor and return its outcome.
///
/// Failed dispatches are still 200: the failure is part of the result body.
pub async fn route_request(
    State(state): State<AdminState>,
    Json(request): Json<DispatchRequest>,
) -> Json<RoutingResult> {
    Json(state.dispatcher.route(&request).await)
}
