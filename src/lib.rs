// src/lib.rs

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::HeaderValue, middleware, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod auth;
pub mod clearance;
pub mod config;
pub mod db;
pub mod error;
pub mod excel;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod store;

use clearance::ClearanceForms;
use config::{Config, CorsOrigins};
use reconcile::Reconciler;
use store::EmployeeStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EmployeeStore>,
    pub reconciler: Arc<Reconciler>,
    pub clearance: Arc<ClearanceForms>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every component around one store.
    pub fn new(store: Arc<dyn EmployeeStore>, config: Config) -> Self {
        Self {
            reconciler: Arc::new(Reconciler::new(store.clone())),
            clearance: Arc::new(ClearanceForms::new(config.clearance_template.clone())),
            store,
            config: Arc::new(config),
        }
    }
}

fn cors(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let parsed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(origin = %o, "ignoring malformed CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(parsed)
        }
    }
}

/// Full application: `/api` routes, stub authentication, body limit, CORS
/// and request tracing.
pub fn app(state: AppState) -> Router {
    let api = routes::api_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::authenticate,
    ));

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
