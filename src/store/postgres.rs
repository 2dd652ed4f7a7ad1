// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{Acquire, PgPool, Postgres, QueryBuilder, Transaction};

use super::{EmployeeStore, ReplaceSession, StoreError, StoreResult};
use crate::models::{
    Employee, EmployeeField, EmployeeFilters, EmployeePatch, EmployeeSummary, NewEmployee, Page,
    PatchValue, SortSpec, SEARCH_FIELDS,
};

const SUMMARY_COLUMNS: &str =
    "empcode, full_name, position, proj_name, rank, emp_status, cbe_noncbe, status";

fn employee_columns() -> String {
    EmployeeField::ALL
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Columns written on insert; timestamps come from column defaults.
fn insert_fields() -> impl Iterator<Item = EmployeeField> {
    EmployeeField::ALL
        .iter()
        .copied()
        .filter(|f| !matches!(f, EmployeeField::CreatedAt | EmployeeField::UpdatedAt))
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Text columns order case-insensitively with NULL as "".
fn sort_key(field: EmployeeField) -> String {
    match field {
        EmployeeField::No | EmployeeField::CreatedAt | EmployeeField::UpdatedAt => {
            field.column().to_string()
        }
        text => format!("LOWER(COALESCE({}, ''))", text.column()),
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn write_error(e: sqlx::Error, empcode: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateKey(empcode.to_string());
        }
    }
    backend(e)
}

fn insert_query(employee: &NewEmployee) -> QueryBuilder<'static, Postgres> {
    let fields: Vec<EmployeeField> = insert_fields().collect();
    let columns = fields.iter().map(|f| f.column()).collect::<Vec<_>>().join(", ");

    let mut qb = QueryBuilder::new(format!("INSERT INTO employees ({columns}) VALUES ("));
    let mut values = qb.separated(", ");
    for field in fields {
        match field {
            EmployeeField::No => values.push_bind(employee.no),
            EmployeeField::Role => values.push_bind(employee.role.as_str()),
            EmployeeField::Status => values.push_bind(employee.status.as_str()),
            text => values.push_bind(employee.text(text).map(str::to_string)),
        };
    }
    values.push_unseparated(")");
    qb.push(format!(" RETURNING {}", employee_columns()));
    qb
}

pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    async fn find_all(
        &self,
        filters: &EmployeeFilters,
        sort: Option<SortSpec>,
        page: Option<Page>,
    ) -> StoreResult<Vec<EmployeeSummary>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} FROM employees WHERE 1=1"));

        for (field, value) in filters.exact_matches() {
            qb.push(format!(" AND {} = ", field.column()));
            qb.push_bind(value);
        }

        if let Some(needle) = filters.search_needle() {
            let pattern = format!("%{}%", escape_like(&needle));
            qb.push(" AND (");
            for (i, field) in SEARCH_FIELDS.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("LOWER({}) LIKE ", field.column()));
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }

        // seq keeps insertion order and breaks ties
        match sort {
            Some(s) => qb.push(format!(
                " ORDER BY {} {}, seq ASC",
                sort_key(s.field),
                s.order.sql()
            )),
            None => qb.push(" ORDER BY seq ASC"),
        };

        if let Some(p) = page {
            qb.push(" LIMIT ").push_bind(p.limit);
            qb.push(" OFFSET ").push_bind(p.offset);
        }

        qb.build_query_as::<EmployeeSummary>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)
    }

    async fn find_by_id(&self, empcode: &str) -> StoreResult<Option<Employee>> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE empcode = $1",
            employee_columns()
        ))
        .bind(empcode)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn list_full(&self) -> StoreResult<Vec<Employee>> {
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees ORDER BY seq ASC",
            employee_columns()
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn count(&self) -> StoreResult<u64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        Ok(n.max(0) as u64)
    }

    async fn create(&self, employee: &NewEmployee) -> StoreResult<Employee> {
        insert_query(employee)
            .build_query_as::<Employee>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, &employee.empcode))
    }

    async fn update(&self, empcode: &str, patch: &EmployeePatch) -> StoreResult<Employee> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE employees SET ");
        let mut sets = qb.separated(", ");
        for a in patch.assignments() {
            sets.push(format!("{} = ", a.field.column()));
            match &a.value {
                PatchValue::Text(v) => sets.push_bind_unseparated(v.clone()),
                PatchValue::Int(n) => sets.push_bind_unseparated(*n),
                PatchValue::Role(r) => sets.push_bind_unseparated(r.as_str()),
                PatchValue::Status(s) => sets.push_bind_unseparated(s.as_str()),
            };
        }
        sets.push("updated_at = now()");
        qb.push(" WHERE empcode = ");
        qb.push_bind(empcode.to_string());
        qb.push(format!(" RETURNING {}", employee_columns()));

        qb.build_query_as::<Employee>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, empcode))?
            .ok_or_else(|| StoreError::NotFound(empcode.to_string()))
    }

    async fn delete(&self, empcode: &str) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM employees WHERE empcode = $1")
            .bind(empcode)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(res.rows_affected() > 0)
    }

    async fn begin_replace(&self) -> StoreResult<Box<dyn ReplaceSession + '_>> {
        let tx = self.pool.begin().await.map_err(backend)?;
        Ok(Box::new(PgReplaceSession { tx }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// One transaction for the whole replacement, one savepoint per insert.
struct PgReplaceSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ReplaceSession for PgReplaceSession {
    async fn clear(&mut self) -> StoreResult<u64> {
        let res = sqlx::query("DELETE FROM employees")
            .execute(&mut *self.tx)
            .await
            .map_err(backend)?;
        Ok(res.rows_affected())
    }

    async fn insert(&mut self, employee: &NewEmployee) -> StoreResult<Employee> {
        let mut savepoint = (&mut self.tx).begin().await.map_err(backend)?;
        let inserted = insert_query(employee)
            .build_query_as::<Employee>()
            .fetch_one(&mut *savepoint)
            .await;
        match inserted {
            Ok(row) => {
                savepoint.commit().await.map_err(backend)?;
                Ok(row)
            }
            Err(e) => {
                savepoint.rollback().await.map_err(backend)?;
                Err(write_error(e, &employee.empcode))
            }
        }
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(backend)
    }
}
