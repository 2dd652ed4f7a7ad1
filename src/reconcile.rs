// src/reconcile.rs

//! Bulk reconciliation of one uploaded sheet against the store.
//!
//! `import` replaces the whole table, `update` upserts the sheet's codes and
//! leaves every other record alone. Rows are processed one at a time in
//! sheet order, each inside its own failure boundary.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::models::{EmployeePatch, NewEmployee};
use crate::store::{EmployeeStore, StoreError};

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEntry {
    pub empcode: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    pub empcode: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Records present before the replace.
    pub removed: u64,
    pub created: usize,
    /// In-sheet duplicates plus failed inserts.
    pub skipped: usize,
    pub duplicates: Vec<DuplicateEntry>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub updated: Vec<String>,
    pub inserted: Vec<String>,
    pub skipped: usize,
    pub duplicates: Vec<DuplicateEntry>,
    pub failures: Vec<RowFailure>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Deduplication
// ─────────────────────────────────────────────────────────────────────────────

/// Split a sheet into its first occurrence per code and the repeats, both in
/// sheet order.
pub fn dedupe(rows: Vec<NewEmployee>) -> (Vec<NewEmployee>, Vec<DuplicateEntry>) {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(rows.len());
    let mut duplicates = Vec::new();

    for row in rows {
        if seen.contains(&row.empcode) {
            duplicates.push(DuplicateEntry {
                empcode: row.empcode,
                full_name: row.full_name,
            });
        } else {
            seen.insert(row.empcode.clone());
            unique.push(row);
        }
    }
    (unique, duplicates)
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconciler
// ─────────────────────────────────────────────────────────────────────────────

pub struct Reconciler {
    store: Arc<dyn EmployeeStore>,
    // one bulk run at a time per process
    gate: Mutex<()>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    /// Replace every stored record with the sheet's records.
    ///
    /// Failing to clear or to commit aborts the run and leaves the previous
    /// data in place; a failed insert only skips that row.
    pub async fn import(&self, rows: Vec<NewEmployee>) -> Result<ImportReport, StoreError> {
        let _guard = self.gate.lock().await;
        let span = tracing::info_span!("reconcile", run_id = %Uuid::new_v4(), mode = "import");
        self.run_import(rows).instrument(span).await
    }

    async fn run_import(&self, rows: Vec<NewEmployee>) -> Result<ImportReport, StoreError> {
        let (unique, duplicates) = dedupe(rows);
        let mut report = ImportReport {
            skipped: duplicates.len(),
            duplicates,
            ..Default::default()
        };

        let mut session = self.store.begin_replace().await?;
        report.removed = session.clear().await.map_err(|e| {
            tracing::error!(error = %e, "could not clear employees, import aborted");
            e
        })?;

        for employee in &unique {
            match session.insert(employee).await {
                Ok(_) => report.created += 1,
                Err(e) => {
                    tracing::warn!(empcode = %employee.empcode, error = %e, "insert failed, row skipped");
                    report.skipped += 1;
                    report.failures.push(RowFailure {
                        empcode: employee.empcode.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        session.commit().await?;
        tracing::info!(
            removed = report.removed,
            created = report.created,
            skipped = report.skipped,
            "import finished"
        );
        Ok(report)
    }

    /// Upsert the sheet's records; codes absent from the sheet are untouched.
    pub async fn update(&self, rows: Vec<NewEmployee>) -> SyncReport {
        let _guard = self.gate.lock().await;
        let span = tracing::info_span!("reconcile", run_id = %Uuid::new_v4(), mode = "update");
        self.run_update(rows).instrument(span).await
    }

    async fn run_update(&self, rows: Vec<NewEmployee>) -> SyncReport {
        let (unique, duplicates) = dedupe(rows);
        let mut report = SyncReport {
            skipped: duplicates.len(),
            duplicates,
            ..Default::default()
        };

        for employee in &unique {
            match self.upsert(employee).await {
                Ok(Upserted::Updated) => report.updated.push(employee.empcode.clone()),
                Ok(Upserted::Inserted) => report.inserted.push(employee.empcode.clone()),
                Err(e) => {
                    tracing::warn!(empcode = %employee.empcode, error = %e, "sync failed, row skipped");
                    report.skipped += 1;
                    report.failures.push(RowFailure {
                        empcode: employee.empcode.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            updated = report.updated.len(),
            inserted = report.inserted.len(),
            skipped = report.skipped,
            "update finished"
        );
        report
    }

    async fn upsert(&self, employee: &NewEmployee) -> Result<Upserted, StoreError> {
        match self.store.find_by_id(&employee.empcode).await? {
            Some(_) => {
                self.store
                    .update(&employee.empcode, &EmployeePatch::full(employee))
                    .await?;
                Ok(Upserted::Updated)
            }
            None => {
                self.store.create(employee).await?;
                Ok(Upserted::Inserted)
            }
        }
    }
}

enum Upserted {
    Updated,
    Inserted,
}
