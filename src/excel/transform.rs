// src/excel/transform.rs

//! Raw sheet row to normalized employee record.

use super::{CellValue, RawRow};
use crate::models::{compose_full_name, EmployeeField, EmployeeStatus, NewEmployee, Role};

/// Business code with quotes and every kind of whitespace removed.
pub fn clean_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '"' && *c != '\'' && !c.is_whitespace())
        .collect()
}

/// Integer reading of a cell; anything unparseable is 0.
pub fn parse_int(value: Option<&CellValue>) -> i32 {
    let number = match value {
        Some(CellValue::Number(n)) => *n,
        Some(CellValue::Text(s)) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(n) => n as f64,
                Err(_) => s.parse::<f64>().unwrap_or(0.0),
            }
        }
        Some(CellValue::Bool(_)) | None => 0.0,
    };
    if number.is_finite() {
        number.trunc() as i32
    } else {
        0
    }
}

/// Trimmed text, `None` when blank.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trimmed text, falling back to the column's import default when blank.
pub fn required_text(field: EmployeeField, value: Option<String>) -> String {
    optional_text(value)
        .unwrap_or_else(|| field.import_default().unwrap_or_default().to_string())
}

fn cell_text(row: &RawRow, field: EmployeeField) -> Option<String> {
    optional_text(row.field(field).map(CellValue::to_text))
}

pub fn transform_row(row: &RawRow) -> NewEmployee {
    use EmployeeField as F;

    let code = row
        .field(F::Empcode)
        .map(|v| clean_code(&v.to_text()))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let first = cell_text(row, F::FirstName);
    let middle = cell_text(row, F::MiddleName);
    let last = cell_text(row, F::LastName);
    let full_name = compose_full_name(
        first.as_deref().unwrap_or_default(),
        middle.as_deref(),
        last.as_deref().unwrap_or_default(),
    );

    let emp_status = required_text(F::EmpStatus, cell_text(row, F::EmpStatus));
    let status = EmployeeStatus::from_emp_status(&emp_status);

    NewEmployee {
        no: parse_int(row.field(F::No)),
        empcode: code,
        first_name: required_text(F::FirstName, first),
        middle_name: middle,
        last_name: required_text(F::LastName, last),
        full_name,
        cbe_noncbe: cell_text(row, F::CbeNoncbe),
        rank: required_text(F::Rank, cell_text(row, F::Rank)),
        emp_status,
        position: required_text(F::Position, cell_text(row, F::Position)),
        costcode: cell_text(row, F::Costcode),
        proj_name: required_text(F::ProjName, cell_text(row, F::ProjName)),
        proj_hr: cell_text(row, F::ProjHr),
        email_address: cell_text(row, F::EmailAddress),
        mobile_assignment: cell_text(row, F::MobileAssignment),
        mobile_number: cell_text(row, F::MobileNumber),
        laptop_assignment: cell_text(row, F::LaptopAssignment),
        asset_code: cell_text(row, F::AssetCode),
        others: cell_text(row, F::Others),
        remarks: cell_text(row, F::Remarks),
        role: Role::Employee,
        status,
    }
}
