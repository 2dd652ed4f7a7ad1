// src/models/mod.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub mod fields;

pub use fields::EmployeeField;

// ───────────────────────────────────────
// Enumerated columns (stored as text)
// ───────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

/// Employment statuses that put a record into `inactive`.
const INACTIVE_EMP_STATUSES: &[&str] = &["resigned", "terminated", "end of contract"];

impl EmployeeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::Inactive => "inactive",
        }
    }

    pub fn from_emp_status(emp_status: &str) -> Self {
        let normalized = emp_status.trim().to_lowercase();
        if INACTIVE_EMP_STATUSES.contains(&normalized.as_str()) {
            EmployeeStatus::Inactive
        } else {
            EmployeeStatus::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized value '{0}'")]
pub struct UnknownVariant(pub String);

impl TryFrom<String> for EmployeeStatus {
    type Error = UnknownVariant;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::str::FromStr for EmployeeStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EmployeeStatus::Active),
            "inactive" => Ok(EmployeeStatus::Inactive),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

// ───────────────────────────────────────
// Employee rows
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub no: i32,
    pub empcode: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
    pub cbe_noncbe: Option<String>,
    pub rank: String,
    pub emp_status: String,
    pub position: String,
    pub costcode: Option<String>,
    pub proj_name: String,
    pub proj_hr: Option<String>,
    pub email_address: Option<String>,
    pub mobile_assignment: Option<String>,
    pub mobile_number: Option<String>,
    pub laptop_assignment: Option<String>,
    pub asset_code: Option<String>,
    pub others: Option<String>,
    pub remarks: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(try_from = "String")]
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An employee as it arrives from a sheet or a create request, before the
/// store stamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub no: i32,
    pub empcode: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub full_name: String,
    pub cbe_noncbe: Option<String>,
    pub rank: String,
    pub emp_status: String,
    pub position: String,
    pub costcode: Option<String>,
    pub proj_name: String,
    pub proj_hr: Option<String>,
    pub email_address: Option<String>,
    pub mobile_assignment: Option<String>,
    pub mobile_number: Option<String>,
    pub laptop_assignment: Option<String>,
    pub asset_code: Option<String>,
    pub others: Option<String>,
    pub remarks: Option<String>,
    pub role: Role,
    pub status: EmployeeStatus,
}

/// List-view projection; never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    pub empcode: String,
    pub full_name: String,
    pub position: String,
    pub proj_name: String,
    pub rank: String,
    pub emp_status: String,
    pub cbe_noncbe: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: EmployeeStatus,
}

/// Join the non-empty name parts with single spaces, `Unknown` when none.
pub fn compose_full_name(first: &str, middle: Option<&str>, last: &str) -> String {
    let parts: Vec<&str> = [Some(first), middle, Some(last)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(" ")
    }
}

macro_rules! text_accessors {
    ($ty:ty) => {
        impl $ty {
            /// Current value of a text attribute.
            pub fn text(&self, field: EmployeeField) -> Option<&str> {
                use EmployeeField as F;
                match field {
                    F::Empcode => Some(&self.empcode),
                    F::FirstName => Some(&self.first_name),
                    F::MiddleName => self.middle_name.as_deref(),
                    F::LastName => Some(&self.last_name),
                    F::FullName => Some(&self.full_name),
                    F::CbeNoncbe => self.cbe_noncbe.as_deref(),
                    F::Rank => Some(&self.rank),
                    F::EmpStatus => Some(&self.emp_status),
                    F::Position => Some(&self.position),
                    F::Costcode => self.costcode.as_deref(),
                    F::ProjName => Some(&self.proj_name),
                    F::ProjHr => self.proj_hr.as_deref(),
                    F::EmailAddress => self.email_address.as_deref(),
                    F::MobileAssignment => self.mobile_assignment.as_deref(),
                    F::MobileNumber => self.mobile_number.as_deref(),
                    F::LaptopAssignment => self.laptop_assignment.as_deref(),
                    F::AssetCode => self.asset_code.as_deref(),
                    F::Others => self.others.as_deref(),
                    F::Remarks => self.remarks.as_deref(),
                    F::Role => Some(self.role.as_str()),
                    F::Status => Some(self.status.as_str()),
                    F::No | F::CreatedAt | F::UpdatedAt => None,
                }
            }
        }
    };
}

text_accessors!(Employee);
text_accessors!(NewEmployee);

impl Employee {
    /// Stamp a new record; both timestamps start equal.
    pub fn from_new(new: NewEmployee, now: DateTime<Utc>) -> Self {
        Self {
            no: new.no,
            empcode: new.empcode,
            first_name: new.first_name,
            middle_name: new.middle_name,
            last_name: new.last_name,
            full_name: new.full_name,
            cbe_noncbe: new.cbe_noncbe,
            rank: new.rank,
            emp_status: new.emp_status,
            position: new.position,
            costcode: new.costcode,
            proj_name: new.proj_name,
            proj_hr: new.proj_hr,
            email_address: new.email_address,
            mobile_assignment: new.mobile_assignment,
            mobile_number: new.mobile_number,
            laptop_assignment: new.laptop_assignment,
            asset_code: new.asset_code,
            others: new.others,
            remarks: new.remarks,
            role: new.role,
            status: new.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply one patch assignment in memory. Non-null text columns ignore a
    /// clear, which [`EmployeePatch`] never produces for them.
    pub fn apply(&mut self, assignment: &Assignment) {
        use EmployeeField as F;
        let text = match &assignment.value {
            PatchValue::Text(text) => text.clone(),
            PatchValue::Int(n) => {
                if assignment.field == F::No {
                    self.no = *n;
                }
                return;
            }
            PatchValue::Role(role) => {
                self.role = *role;
                return;
            }
            PatchValue::Status(status) => {
                self.status = *status;
                return;
            }
        };
        let slot = match assignment.field {
            F::FirstName => &mut self.first_name,
            F::LastName => &mut self.last_name,
            F::FullName => &mut self.full_name,
            F::Rank => &mut self.rank,
            F::EmpStatus => &mut self.emp_status,
            F::Position => &mut self.position,
            F::ProjName => &mut self.proj_name,
            F::MiddleName => return self.middle_name = text,
            F::CbeNoncbe => return self.cbe_noncbe = text,
            F::Costcode => return self.costcode = text,
            F::ProjHr => return self.proj_hr = text,
            F::EmailAddress => return self.email_address = text,
            F::MobileAssignment => return self.mobile_assignment = text,
            F::MobileNumber => return self.mobile_number = text,
            F::LaptopAssignment => return self.laptop_assignment = text,
            F::AssetCode => return self.asset_code = text,
            F::Others => return self.others = text,
            F::Remarks => return self.remarks = text,
            F::Empcode | F::No | F::Role | F::Status | F::CreatedAt | F::UpdatedAt => return,
        };
        if let Some(value) = text {
            *slot = value;
        }
    }

    pub fn summary(&self) -> EmployeeSummary {
        EmployeeSummary {
            empcode: self.empcode.clone(),
            full_name: self.full_name.clone(),
            position: self.position.clone(),
            proj_name: self.proj_name.clone(),
            rank: self.rank.clone(),
            emp_status: self.emp_status.clone(),
            cbe_noncbe: self.cbe_noncbe.clone(),
            status: self.status,
        }
    }
}

// ───────────────────────────────────────
// Partial updates
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    /// `None` clears a nullable column.
    Text(Option<String>),
    Int(i32),
    Role(Role),
    Status(EmployeeStatus),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: EmployeeField,
    pub value: PatchValue,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("{0} cannot be cleared")]
    Required(EmployeeField),
    #[error("{0} cannot be changed")]
    Immutable(EmployeeField),
}

/// Ordered set of column assignments. Fields never assigned stay untouched;
/// `updatedAt` is refreshed by the store regardless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeePatch {
    assignments: Vec<Assignment>,
}

impl EmployeePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed text; an empty value clears the column when it is nullable.
    pub fn set_text(&mut self, field: EmployeeField, raw: &str) -> Result<(), PatchError> {
        if !fields::TEXT_FIELDS.contains(&field) {
            return Err(PatchError::Immutable(field));
        }
        let value = raw.trim();
        let value = if value.is_empty() {
            if !field.nullable() {
                return Err(PatchError::Required(field));
            }
            None
        } else {
            Some(value.to_string())
        };
        self.push(field, PatchValue::Text(value));
        Ok(())
    }

    pub fn set_no(&mut self, no: i32) {
        self.push(EmployeeField::No, PatchValue::Int(no));
    }

    pub fn set_role(&mut self, role: Role) {
        self.push(EmployeeField::Role, PatchValue::Role(role));
    }

    pub fn set_status(&mut self, status: EmployeeStatus) {
        self.push(EmployeeField::Status, PatchValue::Status(status));
    }

    /// Overwrite every mutable column with the incoming record, clearing
    /// optional columns the record leaves empty.
    pub fn full(new: &NewEmployee) -> Self {
        let mut patch = Self::new();
        patch.set_no(new.no);
        for field in fields::TEXT_FIELDS {
            let value = new.text(*field).map(str::to_string);
            patch.push(*field, PatchValue::Text(value));
        }
        patch.set_role(new.role);
        patch.set_status(new.status);
        patch
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    fn push(&mut self, field: EmployeeField, value: PatchValue) {
        self.assignments.retain(|a| a.field != field);
        self.assignments.push(Assignment { field, value });
    }
}

// ───────────────────────────────────────
// Listing: filters, sort, paging
// ───────────────────────────────────────
/// Attributes the free-text search looks into.
pub const SEARCH_FIELDS: &[EmployeeField] = &[
    EmployeeField::Empcode,
    EmployeeField::FullName,
    EmployeeField::Position,
    EmployeeField::ProjName,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilters {
    pub search: Option<String>,
    pub rank: Option<String>,
    pub emp_status: Option<String>,
    pub position: Option<String>,
    pub proj_name: Option<String>,
    pub cbe_noncbe: Option<String>,
    pub costcode: Option<String>,
    pub status: Option<EmployeeStatus>,
}

impl EmployeeFilters {
    /// Exact-match conditions, all of which must hold.
    pub fn exact_matches(&self) -> Vec<(EmployeeField, String)> {
        let mut out = Vec::new();
        let pairs = [
            (EmployeeField::Rank, &self.rank),
            (EmployeeField::EmpStatus, &self.emp_status),
            (EmployeeField::Position, &self.position),
            (EmployeeField::ProjName, &self.proj_name),
            (EmployeeField::CbeNoncbe, &self.cbe_noncbe),
            (EmployeeField::Costcode, &self.costcode),
        ];
        for (field, value) in pairs {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                out.push((field, v.to_string()));
            }
        }
        if let Some(status) = self.status {
            out.push((EmployeeField::Status, status.as_str().to_string()));
        }
        out
    }

    /// Lower-cased search needle, if any.
    pub fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: EmployeeField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_skips_empty_parts() {
        assert_eq!(compose_full_name("Jane", Some(""), "Doe"), "Jane Doe");
        assert_eq!(compose_full_name(" Jane ", Some("Q"), "Doe"), "Jane Q Doe");
        assert_eq!(compose_full_name("", None, "  "), "Unknown");
    }

    #[test]
    fn status_follows_employment_status() {
        assert_eq!(EmployeeStatus::from_emp_status("Resigned"), EmployeeStatus::Inactive);
        assert_eq!(EmployeeStatus::from_emp_status("end of contract"), EmployeeStatus::Inactive);
        assert_eq!(EmployeeStatus::from_emp_status(" Terminated "), EmployeeStatus::Inactive);
        assert_eq!(EmployeeStatus::from_emp_status("Active"), EmployeeStatus::Active);
        assert_eq!(EmployeeStatus::from_emp_status("Probationary"), EmployeeStatus::Active);
    }

    #[test]
    fn patch_clears_nullable_and_refuses_required() {
        let mut patch = EmployeePatch::new();
        patch.set_text(EmployeeField::Remarks, "  ").unwrap();
        assert_eq!(
            patch.assignments()[0].value,
            PatchValue::Text(None)
        );
        assert_eq!(
            patch.set_text(EmployeeField::Position, ""),
            Err(PatchError::Required(EmployeeField::Position))
        );
        assert_eq!(
            patch.set_text(EmployeeField::Empcode, "X1"),
            Err(PatchError::Immutable(EmployeeField::Empcode))
        );
    }

    #[test]
    fn later_assignment_replaces_earlier() {
        let mut patch = EmployeePatch::new();
        patch.set_text(EmployeeField::Rank, "Staff").unwrap();
        patch.set_text(EmployeeField::Rank, "Manager").unwrap();
        assert_eq!(patch.assignments().len(), 1);
        assert_eq!(
            patch.assignments()[0].value,
            PatchValue::Text(Some("Manager".into()))
        );
    }

    #[test]
    fn filters_skip_blank_values() {
        let filters = EmployeeFilters {
            rank: Some(String::new()),
            position: Some("Engineer".into()),
            status: Some(EmployeeStatus::Inactive),
            search: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(
            filters.exact_matches(),
            vec![
                (EmployeeField::Position, "Engineer".to_string()),
                (EmployeeField::Status, "inactive".to_string()),
            ]
        );
        assert_eq!(filters.search_needle(), None);
    }
}
