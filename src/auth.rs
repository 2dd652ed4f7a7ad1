// src/auth.rs

//! Caller identity and role permissions.
//!
//! Authentication is a stub: every request is attributed to user `1` with
//! the role from configuration. Handlers still check permissions so a real
//! authenticator can replace the stub without touching them.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::Role;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Employees,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Delete,
    Import,
    Export,
}

struct Permission {
    resource: Resource,
    actions: &'static [Action],
}

const ADMIN_PERMISSIONS: &[Permission] = &[Permission {
    resource: Resource::Employees,
    actions: &[
        Action::Read,
        Action::Write,
        Action::Delete,
        Action::Import,
        Action::Export,
    ],
}];

const EMPLOYEE_PERMISSIONS: &[Permission] = &[Permission {
    resource: Resource::Employees,
    actions: &[Action::Read],
}];

fn permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Employee => EMPLOYEE_PERMISSIONS,
    }
}

pub fn has_permission(role: Role, resource: Resource, action: Action) -> bool {
    permissions(role)
        .iter()
        .any(|p| p.resource == resource && p.actions.contains(&action))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn require(&self, resource: Resource, action: Action) -> Result<(), AppError> {
        if has_permission(self.role, resource, action) {
            Ok(())
        } else {
            tracing::debug!(user = %self.id, role = self.role.as_str(), ?action, "permission denied");
            Err(AppError::Forbidden)
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Stub authenticator; attaches the configured identity to the request.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(CurrentUser {
        id: "1".to_string(),
        role: state.config.auth_stub_role,
    });
    next.run(req).await
}
