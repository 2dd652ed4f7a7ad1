// src/error.rs

//! HTTP-facing error type and the `{ success, data | error }` envelope.

use axum::{
    extract::{
        multipart::MultipartError,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::clearance::ClearanceError;
use crate::excel::CodecError;
use crate::models::PatchError;
use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    })
}

pub fn ok_empty() -> Json<ApiResponse<()>> {
    Json(ApiResponse {
        success: true,
        data: None,
        error: None,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Clearance type must be either \"project-hire\" or \"contractual\"")]
    InvalidType,

    #[error("No file uploaded")]
    NoFile,

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0}")]
    NotFound(String),

    #[error("Employee {0} already exists")]
    DuplicateKey(String),

    #[error("Clearance form template not found")]
    TemplateMissing(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("{0}")]
    Codec(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InvalidType
            | AppError::NoFile
            | AppError::Codec(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::TemplateMissing(_) | AppError::Store(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InvalidType => "INVALID_TYPE",
            AppError::NoFile => "NO_FILE",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateKey(_) => "DUPLICATE_KEY",
            AppError::TemplateMissing(_) => "TEMPLATE_MISSING",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Codec(_) => "CODEC_ERROR",
            AppError::Internal(_) => "SERVER_ERROR",
        }
    }

    pub fn employee_not_found() -> Self {
        AppError::NotFound("Employee not found".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // internals stay in the log, the caller gets a generic message
        let message = match &self {
            AppError::Store(cause) => {
                tracing::error!(target: "store", error = %cause, "store failure");
                "Database error".to_string()
            }
            AppError::Internal(cause) => {
                tracing::error!(error = %cause, "internal failure");
                "Internal server error".to_string()
            }
            AppError::TemplateMissing(path) => {
                tracing::error!(path = %path, "clearance template missing");
                self.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: self.code(),
                message,
            }),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => AppError::employee_not_found(),
            StoreError::DuplicateKey(code) => AppError::DuplicateKey(code),
            StoreError::Backend(cause) => AppError::Store(cause),
        }
    }
}

impl From<CodecError> for AppError {
    fn from(e: CodecError) -> Self {
        AppError::Codec(e.to_string())
    }
}

impl From<ClearanceError> for AppError {
    fn from(e: ClearanceError) -> Self {
        match e {
            ClearanceError::TemplateMissing(path) => {
                AppError::TemplateMissing(path.display().to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PatchError> for AppError {
    fn from(e: PatchError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart request: {e}"))
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(e.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_http_kinds() {
        let e: AppError = StoreError::DuplicateKey("E1".into()).into();
        assert_eq!(e.status(), StatusCode::CONFLICT);
        assert_eq!(e.code(), "DUPLICATE_KEY");

        let e: AppError = StoreError::NotFound("E1".into()).into();
        assert_eq!(e.status(), StatusCode::NOT_FOUND);

        let e: AppError = StoreError::Backend("connection reset".into()).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code(), "STORE_ERROR");
    }

    #[test]
    fn codec_failure_is_a_client_error() {
        let e = AppError::Codec("not a workbook".into());
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }
}
