// src/models/fields.rs

//! One table for every employee attribute: JSON key, database column,
//! spreadsheet header and nullability. The store builds its SQL from it and
//! the spreadsheet side reads and writes headers from it, so the two cannot
//! drift apart.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmployeeField {
    No,
    Empcode,
    FirstName,
    MiddleName,
    LastName,
    FullName,
    CbeNoncbe,
    Rank,
    EmpStatus,
    Position,
    Costcode,
    ProjName,
    ProjHr,
    EmailAddress,
    MobileAssignment,
    MobileNumber,
    LaptopAssignment,
    AssetCode,
    Others,
    Remarks,
    Role,
    Status,
    CreatedAt,
    UpdatedAt,
}

use EmployeeField::*;

/// Column order of the exported sheet.
pub const SHEET_COLUMNS: &[EmployeeField] = &[
    No,
    Empcode,
    LastName,
    FirstName,
    MiddleName,
    CbeNoncbe,
    Rank,
    EmpStatus,
    Position,
    Costcode,
    ProjName,
    ProjHr,
    EmailAddress,
    MobileAssignment,
    MobileNumber,
    LaptopAssignment,
    AssetCode,
    Others,
    Remarks,
];

/// Free-text attributes that can be written through a partial update.
pub const TEXT_FIELDS: &[EmployeeField] = &[
    FirstName,
    MiddleName,
    LastName,
    FullName,
    CbeNoncbe,
    Rank,
    EmpStatus,
    Position,
    Costcode,
    ProjName,
    ProjHr,
    EmailAddress,
    MobileAssignment,
    MobileNumber,
    LaptopAssignment,
    AssetCode,
    Others,
    Remarks,
];

impl EmployeeField {
    pub const ALL: &'static [EmployeeField] = &[
        No,
        Empcode,
        FirstName,
        MiddleName,
        LastName,
        FullName,
        CbeNoncbe,
        Rank,
        EmpStatus,
        Position,
        Costcode,
        ProjName,
        ProjHr,
        EmailAddress,
        MobileAssignment,
        MobileNumber,
        LaptopAssignment,
        AssetCode,
        Others,
        Remarks,
        Role,
        Status,
        CreatedAt,
        UpdatedAt,
    ];

    pub fn column(self) -> &'static str {
        match self {
            No => "no",
            Empcode => "empcode",
            FirstName => "first_name",
            MiddleName => "middle_name",
            LastName => "last_name",
            FullName => "full_name",
            CbeNoncbe => "cbe_noncbe",
            Rank => "rank",
            EmpStatus => "emp_status",
            Position => "position",
            Costcode => "costcode",
            ProjName => "proj_name",
            ProjHr => "proj_hr",
            EmailAddress => "email_address",
            MobileAssignment => "mobile_assignment",
            MobileNumber => "mobile_number",
            LaptopAssignment => "laptop_assignment",
            AssetCode => "asset_code",
            Others => "others",
            Remarks => "remarks",
            Role => "role",
            Status => "status",
            CreatedAt => "created_at",
            UpdatedAt => "updated_at",
        }
    }

    pub fn json_key(self) -> &'static str {
        match self {
            No => "no",
            Empcode => "empcode",
            FirstName => "firstName",
            MiddleName => "middleName",
            LastName => "lastName",
            FullName => "fullName",
            CbeNoncbe => "cbeNoncbe",
            Rank => "rank",
            EmpStatus => "empStatus",
            Position => "position",
            Costcode => "costcode",
            ProjName => "projName",
            ProjHr => "projHr",
            EmailAddress => "emailAddress",
            MobileAssignment => "mobileAssignment",
            MobileNumber => "mobileNumber",
            LaptopAssignment => "laptopAssignment",
            AssetCode => "assetCode",
            Others => "others",
            Remarks => "remarks",
            Role => "role",
            Status => "status",
            CreatedAt => "createdAt",
            UpdatedAt => "updatedAt",
        }
    }

    /// Spreadsheet header, `None` for attributes that never travel in a sheet.
    pub fn header(self) -> Option<&'static str> {
        let header = match self {
            No => "NO",
            Empcode => "EMPCODE",
            FirstName => "FIRST NAME",
            MiddleName => "MIDDLE NAME",
            LastName => "LAST NAME",
            CbeNoncbe => "CBE/NonCBE",
            Rank => "RANK",
            EmpStatus => "EMP STATUS",
            Position => "POSITION",
            Costcode => "COSTCODE",
            ProjName => "PROJ NAME",
            ProjHr => "PROJ HR",
            EmailAddress => "EMAIL ADDRESS",
            MobileAssignment => "MOBILE ASSIGNMENT",
            MobileNumber => "MOBILE NUMBER",
            LaptopAssignment => "LAPTOP ASSIGNMENT",
            AssetCode => "ASSET CODE",
            Others => "OTHERS\n(Specify items assigned)",
            Remarks => "REMARKS",
            FullName | Role | Status | CreatedAt | UpdatedAt => return None,
        };
        Some(header)
    }

    pub fn nullable(self) -> bool {
        matches!(
            self,
            MiddleName
                | CbeNoncbe
                | Costcode
                | ProjHr
                | EmailAddress
                | MobileAssignment
                | MobileNumber
                | LaptopAssignment
                | AssetCode
                | Others
                | Remarks
        )
    }

    /// Value stored when an imported row leaves a non-null text column blank.
    pub fn import_default(self) -> Option<&'static str> {
        match self {
            Empcode => Some("UNKNOWN"),
            FirstName | LastName | FullName | EmpStatus => Some("Unknown"),
            Rank | Position | ProjName => Some("Not Specified"),
            _ => None,
        }
    }

    /// Exported sheet column width in characters.
    pub fn sheet_width(self) -> f64 {
        match self {
            No => 5.0,
            Empcode | CbeNoncbe | Costcode => 12.0,
            Position | ProjName | Others | Remarks => 30.0,
            EmailAddress => 28.0,
            _ => 18.0,
        }
    }
}

impl fmt::Display for EmployeeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown employee field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for EmployeeField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmployeeField::ALL
            .iter()
            .copied()
            .find(|f| f.json_key() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}
