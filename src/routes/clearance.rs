// src/routes/clearance.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::auth::{Action, CurrentUser, Resource};
use crate::clearance::{ClearanceFields, ClearanceType};
use crate::error::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct ClearanceQ {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Header-safe filename; anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn clearance_filename(last_name: &str) -> String {
    let safe: String = last_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("Clearance_Form_{safe}.pdf")
}

pub async fn generate_clearance(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code): Path<String>,
    Query(q): Query<ClearanceQ>,
) -> Result<Response, AppError> {
    user.require(Resource::Employees, Action::Read)?;

    // type is checked before touching the store or the template
    let kind: ClearanceType = q
        .kind
        .as_deref()
        .ok_or(AppError::InvalidType)?
        .parse()
        .map_err(|_| AppError::InvalidType)?;

    let employee = state
        .store
        .find_by_id(&code)
        .await?
        .ok_or_else(AppError::employee_not_found)?;

    let fields = ClearanceFields {
        employee_name: employee.full_name.clone(),
        position: employee.position.clone(),
        department: employee.proj_name.clone(),
    };
    let pdf = state.clearance.fill(kind, &fields).await?;

    let filename = clearance_filename(&employee.last_name);
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(empcode = %code, ?kind, size = pdf.len(), "clearance form generated");

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_header_safe() {
        assert_eq!(clearance_filename("Reyes"), "Clearance_Form_Reyes.pdf");
        assert_eq!(clearance_filename("dela Cruz"), "Clearance_Form_dela_Cruz.pdf");
        assert_eq!(clearance_filename("Peña\""), "Clearance_Form_Pe_a_.pdf");
    }
}
