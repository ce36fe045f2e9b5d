//! Authenticated admin API.
//!
//! # Endpoints
//! - `GET /admin/status`: version and engine summary
//! - `GET /admin/endpoints`, `POST /admin/endpoints`, `DELETE /admin/endpoints/{id}`
//! - `GET /admin/stats`: aggregate statistics over the retained history
//! - `GET /admin/history?limit=N`: newest execution records
//! - `GET /admin/rules`: configured routing rules
//! - `POST /admin/route`: dispatch a request descriptor

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::dispatch::Dispatcher;

/// Shared state behind every admin handler.
#[derive(Clone)]
pub struct AdminState {
    pub dispatcher: Arc<Dispatcher>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(dispatcher: Arc<Dispatcher>, api_key: impl Into<Arc<str>>) -> Self {
        Self {
            dispatcher,
            api_key: api_key.into(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/endpoints", get(get_endpoints).post(register_endpoint))
        .route("/admin/endpoints/{id}", delete(deregister_endpoint))
        .route("/admin/stats", get(get_stats))
        .route("/admin/history", get(get_history))
        .route("/admin/rules", get(get_rules))
        .route("/admin/route", post(route_request))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
