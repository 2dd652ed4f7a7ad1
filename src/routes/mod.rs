// src/routes/mod.rs

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod clearance;
pub mod employees;
pub mod health;

/// Every `/api` route. Static employee paths are registered alongside
/// `/employees/:code`; axum prefers the static segment.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // health
        .route("/health", get(health::health))
        // employees
        .route(
            "/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route("/employees/export", get(employees::export_employees))
        .route("/employees/import", post(employees::import_employees))
        .route("/employees/update", post(employees::sync_employees))
        .route(
            "/employees/:code",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        // clearance
        .route("/clearance/:code", get(clearance::generate_clearance))
}
