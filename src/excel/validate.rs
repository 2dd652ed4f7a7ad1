// src/excel/validate.rs

use serde::Serialize;

use super::{CellValue, RawRow};
use crate::models::EmployeeField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Number,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub field: EmployeeField,
    pub required: bool,
    pub kind: ColumnType,
}

const fn rule(field: EmployeeField, required: bool, kind: ColumnType) -> ColumnRule {
    ColumnRule { field, required, kind }
}

/// Checks applied to every uploaded employee row.
pub const EMPLOYEE_RULES: &[ColumnRule] = &[
    rule(EmployeeField::No, false, ColumnType::Number),
    rule(EmployeeField::Empcode, true, ColumnType::String),
    rule(EmployeeField::FirstName, false, ColumnType::String),
    rule(EmployeeField::MiddleName, false, ColumnType::String),
    rule(EmployeeField::LastName, false, ColumnType::String),
    rule(EmployeeField::CbeNoncbe, false, ColumnType::String),
    rule(EmployeeField::Rank, false, ColumnType::String),
    rule(EmployeeField::EmpStatus, false, ColumnType::String),
    rule(EmployeeField::Position, false, ColumnType::String),
    rule(EmployeeField::Costcode, false, ColumnType::String),
    rule(EmployeeField::ProjName, false, ColumnType::String),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    /// Spreadsheet row number (header is row 1).
    pub row: usize,
    pub column: String,
    pub value: Option<CellValue>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub success: bool,
    pub total_rows: usize,
    pub imported_rows: usize,
    pub errors: Vec<RowError>,
}

fn is_numeric(value: &CellValue) -> bool {
    match value {
        CellValue::Number(n) => n.is_finite(),
        CellValue::Text(s) => s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false),
        CellValue::Bool(_) => false,
    }
}

/// Collect every rule violation; nothing here fails early.
pub fn validate_rows(rows: &[RawRow], rules: &[ColumnRule]) -> ValidationReport {
    let mut errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;
        for rule in rules {
            let Some(column) = rule.field.header() else {
                continue;
            };
            let value = row.get(column).filter(|v| !v.is_blank());

            match value {
                None if rule.required => errors.push(RowError {
                    row: row_number,
                    column: column.to_string(),
                    value: None,
                    message: format!("{column} is required"),
                }),
                Some(v) if rule.kind == ColumnType::Number && !is_numeric(v) => {
                    errors.push(RowError {
                        row: row_number,
                        column: column.to_string(),
                        value: Some(v.clone()),
                        message: format!("{column} must be a number"),
                    })
                }
                _ => {}
            }
        }
    }

    ValidationReport {
        success: errors.is_empty(),
        total_rows: rows.len(),
        imported_rows: rows.len().saturating_sub(errors.len()),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn clean_rows_pass() {
        let rows = vec![
            RawRow::new().with("EMPCODE", text("E1")).with("NO", CellValue::Number(1.0)),
            RawRow::new().with("EMPCODE", text("E2")).with("NO", text(" 2 ")),
        ];
        let report = validate_rows(&rows, EMPLOYEE_RULES);
        assert!(report.success);
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.imported_rows, 2);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn missing_required_column_is_reported_with_sheet_row() {
        let rows = vec![
            RawRow::new().with("EMPCODE", text("E1")),
            RawRow::new().with("FIRST NAME", text("Ana")),
            RawRow::new().with("EMPCODE", text("")),
        ];
        let report = validate_rows(&rows, EMPLOYEE_RULES);
        assert!(!report.success);
        assert_eq!(report.imported_rows, 1);
        let rows_flagged: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows_flagged, vec![3, 4]);
        assert_eq!(report.errors[0].message, "EMPCODE is required");
    }

    #[test]
    fn non_numeric_number_column_is_rejected() {
        let rows = vec![RawRow::new()
            .with("EMPCODE", text("E1"))
            .with("NO", text("twelve"))];
        let report = validate_rows(&rows, EMPLOYEE_RULES);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, "NO must be a number");
        assert_eq!(report.errors[0].value, Some(text("twelve")));
    }

    #[test]
    fn number_with_trailing_text_is_rejected() {
        let rows = vec![RawRow::new()
            .with("EMPCODE", text("E1"))
            .with("NO", text("12abc"))];
        let report = validate_rows(&rows, EMPLOYEE_RULES);
        assert!(!report.success);
        assert_eq!(report.errors[0].message, "NO must be a number");
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let rows = vec![RawRow::new().with("EMPCODE", text("E1"))];
        assert!(validate_rows(&rows, EMPLOYEE_RULES).success);
    }

    #[test]
    fn empty_sheet_is_trivially_valid() {
        let report = validate_rows(&[], EMPLOYEE_RULES);
        assert!(report.success);
        assert_eq!(report.total_rows, 0);
    }
}
