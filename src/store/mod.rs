// src/store/mod.rs

//! Persistence seam for the `employees` table.
//!
//! Handlers and the reconciler only ever see `Arc<dyn EmployeeStore>`; the
//! process entry point decides which implementation backs it and owns its
//! shutdown.

use async_trait::async_trait;

use crate::models::{
    Employee, EmployeeFilters, EmployeePatch, EmployeeSummary, NewEmployee, Page, SortSpec,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEmployeeStore;
pub use postgres::PgEmployeeStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("employee {0} already exists")]
    DuplicateKey(String),

    #[error("employee {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Summaries matching every exact filter and the optional search,
    /// in `sort` order or insertion order.
    async fn find_all(
        &self,
        filters: &EmployeeFilters,
        sort: Option<SortSpec>,
        page: Option<Page>,
    ) -> StoreResult<Vec<EmployeeSummary>>;

    async fn find_by_id(&self, empcode: &str) -> StoreResult<Option<Employee>>;

    /// Every full record in insertion order.
    async fn list_full(&self) -> StoreResult<Vec<Employee>>;

    async fn count(&self) -> StoreResult<u64>;

    /// Fails with [`StoreError::DuplicateKey`] when the code is taken.
    async fn create(&self, employee: &NewEmployee) -> StoreResult<Employee>;

    /// Fails with [`StoreError::NotFound`] when the code is absent.
    async fn update(&self, empcode: &str, patch: &EmployeePatch) -> StoreResult<Employee>;

    /// `false` when nothing was deleted.
    async fn delete(&self, empcode: &str) -> StoreResult<bool>;

    /// Open a session that replaces the whole table on commit.
    async fn begin_replace(&self) -> StoreResult<Box<dyn ReplaceSession + '_>>;

    async fn close(&self);
}

/// Staged full-table replacement. Nothing is visible to readers until
/// [`ReplaceSession::commit`]; dropping the session discards it.
#[async_trait]
pub trait ReplaceSession: Send {
    /// Remove every existing record, returning how many there were.
    async fn clear(&mut self) -> StoreResult<u64>;

    /// Insert one record. A failure only affects this record.
    async fn insert(&mut self, employee: &NewEmployee) -> StoreResult<Employee>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
