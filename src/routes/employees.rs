// src/routes/employees.rs

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::{Action, CurrentUser, Resource};
use crate::error::{ok, ok_empty, ApiResponse, AppError};
use crate::excel::transform::{clean_code, optional_text, required_text};
use crate::excel::validate::RowError;
use crate::excel::{self, PreparedSheet, ValidationReport};
use crate::models::{
    compose_full_name, Employee, EmployeeField, EmployeeFilters, EmployeePatch, EmployeeStatus,
    EmployeeSummary, NewEmployee, Page, Role, SortOrder, SortSpec,
};
use crate::reconcile::{DuplicateEntry, RowFailure};
use crate::AppState;

const MAX_PAGE: i64 = 5000;
const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response models
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListQ {
    pub search: Option<String>,
    pub rank: Option<String>,
    pub emp_status: Option<String>,
    pub position: Option<String>,
    pub proj_name: Option<String>,
    pub cbe_noncbe: Option<String>,
    pub costcode: Option<String>,
    pub status: Option<EmployeeStatus>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQ {
    fn filters(&self) -> EmployeeFilters {
        EmployeeFilters {
            search: self.search.clone(),
            rank: self.rank.clone(),
            emp_status: self.emp_status.clone(),
            position: self.position.clone(),
            proj_name: self.proj_name.clone(),
            cbe_noncbe: self.cbe_noncbe.clone(),
            costcode: self.costcode.clone(),
            status: self.status,
        }
    }

    fn sort(&self) -> Result<Option<SortSpec>, AppError> {
        let Some(key) = self.sort_by.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(None);
        };
        let field: EmployeeField = key
            .parse()
            .map_err(|e| AppError::BadRequest(format!("invalid sortBy: {e}")))?;
        Ok(Some(SortSpec {
            field,
            order: self.sort_order.unwrap_or_default(),
        }))
    }

    fn page(&self) -> Option<Page> {
        if self.limit.is_none() && self.offset.is_none() {
            return None;
        }
        Some(Page {
            limit: self.limit.unwrap_or(MAX_PAGE).clamp(1, MAX_PAGE),
            offset: self.offset.unwrap_or(0).max(0),
        })
    }
}

/// Body of `POST /employees`; normalized the same way as a sheet row.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeBody {
    pub no: Option<i32>,
    pub empcode: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub cbe_noncbe: Option<String>,
    pub rank: Option<String>,
    pub emp_status: Option<String>,
    pub position: Option<String>,
    pub costcode: Option<String>,
    pub proj_name: Option<String>,
    pub proj_hr: Option<String>,
    pub email_address: Option<String>,
    pub mobile_assignment: Option<String>,
    pub mobile_number: Option<String>,
    pub laptop_assignment: Option<String>,
    pub asset_code: Option<String>,
    pub others: Option<String>,
    pub remarks: Option<String>,
    pub role: Option<Role>,
    pub status: Option<EmployeeStatus>,
}

impl CreateEmployeeBody {
    pub fn into_new(self) -> Result<NewEmployee, AppError> {
        use EmployeeField as F;

        let empcode = self.empcode.as_deref().map(clean_code).unwrap_or_default();
        if empcode.is_empty() {
            return Err(AppError::Validation("empcode is required".to_string()));
        }

        let first = optional_text(self.first_name);
        let middle = optional_text(self.middle_name);
        let last = optional_text(self.last_name);
        let full_name = optional_text(self.full_name).unwrap_or_else(|| {
            compose_full_name(
                first.as_deref().unwrap_or_default(),
                middle.as_deref(),
                last.as_deref().unwrap_or_default(),
            )
        });
        let emp_status = required_text(F::EmpStatus, self.emp_status);
        let status = self
            .status
            .unwrap_or_else(|| EmployeeStatus::from_emp_status(&emp_status));

        Ok(NewEmployee {
            no: self.no.unwrap_or(0),
            empcode,
            first_name: required_text(F::FirstName, first),
            middle_name: middle,
            last_name: required_text(F::LastName, last),
            full_name,
            cbe_noncbe: optional_text(self.cbe_noncbe),
            rank: required_text(F::Rank, self.rank),
            emp_status,
            position: required_text(F::Position, self.position),
            costcode: optional_text(self.costcode),
            proj_name: required_text(F::ProjName, self.proj_name),
            proj_hr: optional_text(self.proj_hr),
            email_address: optional_text(self.email_address),
            mobile_assignment: optional_text(self.mobile_assignment),
            mobile_number: optional_text(self.mobile_number),
            laptop_assignment: optional_text(self.laptop_assignment),
            asset_code: optional_text(self.asset_code),
            others: optional_text(self.others),
            remarks: optional_text(self.remarks),
            role: self.role.unwrap_or(Role::Employee),
            status,
        })
    }
}

/// Body of `PUT /employees/:code`. Absent fields stay untouched, `""` clears
/// an optional field. `empcode` and the timestamps are not accepted here and
/// are ignored if sent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeBody {
    pub no: Option<i32>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub cbe_noncbe: Option<String>,
    pub rank: Option<String>,
    pub emp_status: Option<String>,
    pub position: Option<String>,
    pub costcode: Option<String>,
    pub proj_name: Option<String>,
    pub proj_hr: Option<String>,
    pub email_address: Option<String>,
    pub mobile_assignment: Option<String>,
    pub mobile_number: Option<String>,
    pub laptop_assignment: Option<String>,
    pub asset_code: Option<String>,
    pub others: Option<String>,
    pub remarks: Option<String>,
    pub role: Option<Role>,
    pub status: Option<EmployeeStatus>,
}

impl UpdateEmployeeBody {
    pub fn into_patch(self) -> Result<EmployeePatch, AppError> {
        use EmployeeField as F;

        let mut patch = EmployeePatch::new();
        if let Some(no) = self.no {
            patch.set_no(no);
        }
        let texts = [
            (F::FirstName, self.first_name),
            (F::MiddleName, self.middle_name),
            (F::LastName, self.last_name),
            (F::FullName, self.full_name),
            (F::CbeNoncbe, self.cbe_noncbe),
            (F::Rank, self.rank),
            (F::EmpStatus, self.emp_status),
            (F::Position, self.position),
            (F::Costcode, self.costcode),
            (F::ProjName, self.proj_name),
            (F::ProjHr, self.proj_hr),
            (F::EmailAddress, self.email_address),
            (F::MobileAssignment, self.mobile_assignment),
            (F::MobileNumber, self.mobile_number),
            (F::LaptopAssignment, self.laptop_assignment),
            (F::AssetCode, self.asset_code),
            (F::Others, self.others),
            (F::Remarks, self.remarks),
        ];
        for (field, value) in texts {
            if let Some(value) = value {
                patch.set_text(field, &value)?;
            }
        }
        if let Some(role) = self.role {
            patch.set_role(role);
        }
        if let Some(status) = self.status {
            patch.set_status(status);
        }
        Ok(patch)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub total_rows: usize,
    pub imported_rows: usize,
    pub removed_rows: u64,
    pub skipped_rows: usize,
    pub duplicates: Vec<DuplicateEntry>,
    pub failures: Vec<RowFailure>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub success: bool,
    pub total_rows: usize,
    pub updated_rows: usize,
    pub inserted_rows: usize,
    pub skipped_rows: usize,
    pub updated: Vec<String>,
    pub inserted: Vec<String>,
    pub duplicates: Vec<DuplicateEntry>,
    pub failures: Vec<RowFailure>,
    pub errors: Vec<RowError>,
}

/// Either the validator's report (nothing written) or the run result.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UploadOutcome<T> {
    Rejected(ValidationReport),
    Done(T),
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Bytes of the multipart field named `file`.
async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Bytes, AppError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "upload is not a multipart request");
        AppError::NoFile
    })?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::NoFile);
        }
        let digest = Sha256::digest(&bytes);
        tracing::info!(
            filename = filename.as_deref().unwrap_or("-"),
            size = bytes.len(),
            sha256 = %format!("{digest:x}"),
            "received spreadsheet upload"
        );
        return Ok(bytes);
    }
    Err(AppError::NoFile)
}

/// Decode, validate and transform off the async runtime.
async fn prepare_upload(bytes: Bytes) -> Result<PreparedSheet, AppError> {
    tokio::task::spawn_blocking(move || excel::prepare(&bytes))
        .await
        .map_err(|e| AppError::Internal(format!("spreadsheet task failed: {e}")))?
        .map_err(AppError::from)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_employees(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<ListQ>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<EmployeeSummary>>>, AppError> {
    user.require(Resource::Employees, Action::Read)?;
    let Query(q) = query?;

    let rows = state
        .store
        .find_all(&q.filters(), q.sort()?, q.page())
        .await?;
    Ok(ok(rows))
}

pub async fn get_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Employee>>, AppError> {
    user.require(Resource::Employees, Action::Read)?;

    let employee = state
        .store
        .find_by_id(&code)
        .await?
        .ok_or_else(AppError::employee_not_found)?;
    Ok(ok(employee))
}

pub async fn create_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<CreateEmployeeBody>, JsonRejection>,
) -> Result<Json<ApiResponse<Employee>>, AppError> {
    user.require(Resource::Employees, Action::Write)?;
    let Json(body) = body?;

    let new = body.into_new()?;
    let created = state.store.create(&new).await?;
    tracing::info!(empcode = %created.empcode, "employee created");
    Ok(ok(created))
}

pub async fn update_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code): Path<String>,
    body: Result<Json<UpdateEmployeeBody>, JsonRejection>,
) -> Result<Json<ApiResponse<Employee>>, AppError> {
    user.require(Resource::Employees, Action::Write)?;
    let Json(body) = body?;

    let patch = body.into_patch()?;
    let updated = state.store.update(&code, &patch).await?;
    tracing::info!(empcode = %code, fields = patch.assignments().len(), "employee updated");
    Ok(ok(updated))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    user.require(Resource::Employees, Action::Delete)?;

    if !state.store.delete(&code).await? {
        return Err(AppError::employee_not_found());
    }
    tracing::info!(empcode = %code, "employee deleted");
    Ok(ok_empty())
}

/// Replace-all import from an uploaded sheet.
pub async fn import_employees(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UploadOutcome<ImportResult>>>, AppError> {
    user.require(Resource::Employees, Action::Import)?;
    let bytes = read_upload(multipart).await?;

    let (total_rows, employees) = match prepare_upload(bytes).await? {
        PreparedSheet::Rejected(report) => return Ok(ok(UploadOutcome::Rejected(report))),
        PreparedSheet::Ready { total_rows, employees } => (total_rows, employees),
    };

    let report = state.reconciler.import(employees).await?;
    Ok(ok(UploadOutcome::Done(ImportResult {
        success: true,
        total_rows,
        imported_rows: report.created,
        removed_rows: report.removed,
        skipped_rows: report.skipped,
        duplicates: report.duplicates,
        failures: report.failures,
        errors: Vec::new(),
    })))
}

/// Upsert from an uploaded sheet; records missing from it are kept.
pub async fn sync_employees(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UploadOutcome<UpdateResult>>>, AppError> {
    user.require(Resource::Employees, Action::Import)?;
    let bytes = read_upload(multipart).await?;

    let (total_rows, employees) = match prepare_upload(bytes).await? {
        PreparedSheet::Rejected(report) => return Ok(ok(UploadOutcome::Rejected(report))),
        PreparedSheet::Ready { total_rows, employees } => (total_rows, employees),
    };

    let report = state.reconciler.update(employees).await;
    Ok(ok(UploadOutcome::Done(UpdateResult {
        success: true,
        total_rows,
        updated_rows: report.updated.len(),
        inserted_rows: report.inserted.len(),
        skipped_rows: report.skipped,
        updated: report.updated,
        inserted: report.inserted,
        duplicates: report.duplicates,
        failures: report.failures,
        errors: Vec::new(),
    })))
}

pub async fn export_employees(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    user.require(Resource::Employees, Action::Export)?;

    let employees = state.store.list_full().await?;
    let count = employees.len();
    let bytes = tokio::task::spawn_blocking(move || excel::encode(&employees))
        .await
        .map_err(|e| AppError::Internal(format!("export task failed: {e}")))?
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(employees = count, size = bytes.len(), "exported spreadsheet");

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME),
            (header::CONTENT_DISPOSITION, "attachment; filename=employees.xlsx"),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_is_clamped() {
        let q = ListQ { limit: Some(0), offset: Some(-4), ..Default::default() };
        assert_eq!(q.page(), Some(Page { limit: 1, offset: 0 }));

        let q = ListQ { limit: Some(90_000), ..Default::default() };
        assert_eq!(q.page(), Some(Page { limit: MAX_PAGE, offset: 0 }));

        assert_eq!(ListQ::default().page(), None);
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let q = ListQ { sort_by: Some("salary".into()), ..Default::default() };
        assert!(matches!(q.sort(), Err(AppError::BadRequest(_))));

        let q = ListQ {
            sort_by: Some("projName".into()),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(
            q.sort().unwrap(),
            Some(SortSpec { field: EmployeeField::ProjName, order: SortOrder::Desc })
        );
    }

    #[test]
    fn create_body_is_normalized() {
        let body = CreateEmployeeBody {
            empcode: Some(" 'E-77' ".into()),
            first_name: Some(" Lea ".into()),
            last_name: Some("Tan".into()),
            emp_status: Some("terminated".into()),
            ..Default::default()
        };
        let new = body.into_new().unwrap();
        assert_eq!(new.empcode, "E-77");
        assert_eq!(new.full_name, "Lea Tan");
        assert_eq!(new.position, "Not Specified");
        assert_eq!(new.status, EmployeeStatus::Inactive);
        assert_eq!(new.role, Role::Employee);
    }

    #[test]
    fn create_body_without_code_fails() {
        let body = CreateEmployeeBody { empcode: Some(" \"\" ".into()), ..Default::default() };
        assert!(matches!(body.into_new(), Err(AppError::Validation(_))));
    }

    #[test]
    fn update_body_clears_optional_and_rejects_required() {
        let body = UpdateEmployeeBody { remarks: Some(String::new()), ..Default::default() };
        assert_eq!(body.into_patch().unwrap().assignments().len(), 1);

        let body = UpdateEmployeeBody { position: Some("  ".into()), ..Default::default() };
        assert!(matches!(body.into_patch(), Err(AppError::Validation(_))));
    }
}
