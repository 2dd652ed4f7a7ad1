// src/routes/health.rs

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::{ok, ApiResponse};
use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResp {
    pub status: &'static str,
    pub version: &'static str,
    pub employees: Option<u64>,
}

/// Liveness plus a best-effort store probe; a failing store reports `null`.
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResp>> {
    let employees = match state.store.count().await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(error = %e, "health probe could not reach the store");
            None
        }
    };
    ok(HealthResp {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        employees,
    })
}
