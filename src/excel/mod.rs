// src/excel/mod.rs

//! Spreadsheet codec: uploaded workbook bytes to raw header-keyed rows, and
//! employee lists back to an xlsx download.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;

use crate::models::fields::SHEET_COLUMNS;
use crate::models::{Employee, EmployeeField, NewEmployee};

pub mod transform;
pub mod validate;

pub use validate::{ValidationReport, EMPLOYEE_RULES};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("could not read spreadsheet: {0}")]
    Read(String),

    #[error("could not write spreadsheet: {0}")]
    Write(#[from] XlsxError),

    #[error("too many rows for one sheet: {0}")]
    TooManyRows(usize),
}

/// A single non-empty cell as it came out of the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }

    /// Text rendering used for string columns; whole numbers print without
    /// a fractional part.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

/// One data row keyed by header name. Columns missing from the sheet, and
/// empty cells, are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn field(&self, field: EmployeeField) -> Option<&CellValue> {
        field.header().and_then(|h| self.get(h))
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.insert(column, value);
        self
    }
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

/// Decode the first sheet of an xlsx/xls/ods workbook. The first non-empty
/// row is the header; blank rows after it are dropped.
pub fn decode(bytes: &[u8]) -> Result<Vec<RawRow>, CodecError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| CodecError::Read(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| CodecError::Read(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    let mut rows = range
        .rows()
        .filter(|cells| cells.iter().any(|c| cell_value(c).is_some()));

    let Some(header_cells) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<Option<String>> = header_cells
        .iter()
        .map(|c| cell_value(c).map(|v| v.to_text().trim().to_string()))
        .collect();

    let out = rows
        .map(|cells| {
            let mut row = RawRow::new();
            for (name, cell) in header.iter().zip(cells) {
                if let (Some(name), Some(value)) = (name, cell_value(cell)) {
                    row.insert(name.clone(), value);
                }
            }
            row
        })
        .collect();
    Ok(out)
}

/// Encode employees into a one-sheet workbook with the fixed export columns.
pub fn encode(employees: &[Employee]) -> Result<Vec<u8>, CodecError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Employees")?;

    for (col, field) in SHEET_COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, field.header().unwrap_or_default(), &bold)?;
        sheet.set_column_width(col, field.sheet_width())?;
    }

    for (i, employee) in employees.iter().enumerate() {
        let row = u32::try_from(i + 1).map_err(|_| CodecError::TooManyRows(employees.len()))?;
        for (col, field) in SHEET_COLUMNS.iter().enumerate() {
            let col = col as u16;
            match field {
                EmployeeField::No => {
                    sheet.write_number(row, col, f64::from(employee.no))?;
                }
                _ => {
                    sheet.write_string(row, col, employee.text(*field).unwrap_or_default())?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Outcome of turning an upload into employee records.
#[derive(Debug)]
pub enum PreparedSheet {
    /// Row-level problems; nothing may be written.
    Rejected(ValidationReport),
    Ready {
        total_rows: usize,
        employees: Vec<NewEmployee>,
    },
}

/// Decode, validate and transform one upload.
pub fn prepare(bytes: &[u8]) -> Result<PreparedSheet, CodecError> {
    let rows = decode(bytes)?;
    tracing::info!(rows = rows.len(), "parsed spreadsheet");

    let report = validate::validate_rows(&rows, EMPLOYEE_RULES);
    if !report.success {
        tracing::warn!(errors = report.errors.len(), "spreadsheet failed validation");
        return Ok(PreparedSheet::Rejected(report));
    }

    let employees: Vec<NewEmployee> = rows.iter().map(transform::transform_row).collect();
    Ok(PreparedSheet::Ready {
        total_rows: rows.len(),
        employees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeStatus, Role};
    use chrono::Utc;

    fn employee(code: &str, last: &str) -> Employee {
        let new = NewEmployee {
            no: 7,
            empcode: code.into(),
            first_name: "Ana".into(),
            middle_name: None,
            last_name: last.into(),
            full_name: format!("Ana {last}"),
            cbe_noncbe: Some("Y".into()),
            rank: "Staff".into(),
            emp_status: "Regular".into(),
            position: "Engineer".into(),
            costcode: None,
            proj_name: "North Tower".into(),
            proj_hr: None,
            email_address: Some("ana@example.com".into()),
            mobile_assignment: None,
            mobile_number: None,
            laptop_assignment: None,
            asset_code: None,
            others: Some("badge".into()),
            remarks: None,
            role: Role::Employee,
            status: EmployeeStatus::Active,
        };
        Employee::from_new(new, Utc::now())
    }

    #[test]
    fn exported_sheet_reads_back_with_headers() {
        let bytes = encode(&[employee("E100", "Reyes"), employee("E200", "Cruz")]).unwrap();
        let rows = decode(&bytes).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("EMPCODE"), Some(&CellValue::Text("E100".into())));
        assert_eq!(rows[1].get("LAST NAME"), Some(&CellValue::Text("Cruz".into())));
        assert_eq!(rows[0].get("NO"), Some(&CellValue::Number(7.0)));
        assert_eq!(
            rows[0].get("OTHERS\n(Specify items assigned)"),
            Some(&CellValue::Text("badge".into()))
        );
        // empty optional columns come back absent, not as empty strings
        assert_eq!(rows[0].get("COSTCODE"), None);
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let bytes = encode(&[]).unwrap();
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let err = decode(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, CodecError::Read(_)));
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(CellValue::Number(9171234567.0).to_text(), "9171234567");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    }
}
