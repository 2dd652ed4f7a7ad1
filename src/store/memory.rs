// src/store/memory.rs

//! Volatile store kept in insertion order. Backs `STORE_BACKEND=memory`
//! and the test suite, which also uses its fault hooks.

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{EmployeeStore, ReplaceSession, StoreError, StoreResult};
use crate::models::{
    Employee, EmployeeField, EmployeeFilters, EmployeePatch, EmployeeSummary, NewEmployee, Page,
    SortOrder, SortSpec, SEARCH_FIELDS,
};

#[derive(Debug, Default)]
struct State {
    rows: Vec<Employee>,
    failing_codes: HashSet<String>,
    fail_clear: bool,
}

impl State {
    fn check_writable(&self, empcode: &str) -> StoreResult<()> {
        if self.failing_codes.contains(empcode) {
            return Err(StoreError::Backend(format!("write rejected for {empcode}")));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryEmployeeStore {
    state: RwLock<State>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write and lookup touching `empcode` fail with a backend error.
    pub async fn fail_writes_for(&self, empcode: &str) {
        self.state.write().await.failing_codes.insert(empcode.to_string());
    }

    /// Make the next replace sessions fail at `clear`.
    pub async fn fail_clear(&self, fail: bool) {
        self.state.write().await.fail_clear = fail;
    }
}

fn matches(employee: &Employee, filters: &EmployeeFilters) -> bool {
    let exact = filters
        .exact_matches()
        .into_iter()
        .all(|(field, value)| employee.text(field) == Some(value.as_str()));
    if !exact {
        return false;
    }
    match filters.search_needle() {
        None => true,
        Some(needle) => SEARCH_FIELDS.iter().any(|f| {
            employee
                .text(*f)
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        }),
    }
}

/// Ascending order; text compares case-insensitively with NULL as "".
fn compare(a: &Employee, b: &Employee, field: EmployeeField) -> Ordering {
    match field {
        EmployeeField::No => a.no.cmp(&b.no),
        EmployeeField::CreatedAt => a.created_at.cmp(&b.created_at),
        EmployeeField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        text => {
            let key = |e: &Employee| e.text(text).unwrap_or_default().to_lowercase();
            key(a).cmp(&key(b))
        }
    }
}

fn insert_row(rows: &mut Vec<Employee>, employee: &NewEmployee) -> StoreResult<Employee> {
    if rows.iter().any(|e| e.empcode == employee.empcode) {
        return Err(StoreError::DuplicateKey(employee.empcode.clone()));
    }
    let row = Employee::from_new(employee.clone(), Utc::now());
    rows.push(row.clone());
    Ok(row)
}

#[async_trait]
impl EmployeeStore for MemoryEmployeeStore {
    async fn find_all(
        &self,
        filters: &EmployeeFilters,
        sort: Option<SortSpec>,
        page: Option<Page>,
    ) -> StoreResult<Vec<EmployeeSummary>> {
        let state = self.state.read().await;
        let mut hits: Vec<&Employee> = state.rows.iter().filter(|e| matches(e, filters)).collect();

        if let Some(spec) = sort {
            // stable sort keeps insertion order among equal keys
            hits.sort_by(|a, b| {
                let ord = compare(a, b, spec.field);
                match spec.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let (skip, take) = match page {
            Some(p) => (p.offset.max(0) as usize, p.limit.max(0) as usize),
            None => (0, usize::MAX),
        };
        Ok(hits
            .into_iter()
            .skip(skip)
            .take(take)
            .map(Employee::summary)
            .collect())
    }

    async fn find_by_id(&self, empcode: &str) -> StoreResult<Option<Employee>> {
        let state = self.state.read().await;
        state.check_writable(empcode)?;
        Ok(state.rows.iter().find(|e| e.empcode == empcode).cloned())
    }

    async fn list_full(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.state.read().await.rows.clone())
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.state.read().await.rows.len() as u64)
    }

    async fn create(&self, employee: &NewEmployee) -> StoreResult<Employee> {
        let mut state = self.state.write().await;
        state.check_writable(&employee.empcode)?;
        insert_row(&mut state.rows, employee)
    }

    async fn update(&self, empcode: &str, patch: &EmployeePatch) -> StoreResult<Employee> {
        let mut state = self.state.write().await;
        state.check_writable(empcode)?;
        let row = state
            .rows
            .iter_mut()
            .find(|e| e.empcode == empcode)
            .ok_or_else(|| StoreError::NotFound(empcode.to_string()))?;
        for assignment in patch.assignments() {
            row.apply(assignment);
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, empcode: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.rows.len();
        state.rows.retain(|e| e.empcode != empcode);
        Ok(state.rows.len() < before)
    }

    async fn begin_replace(&self) -> StoreResult<Box<dyn ReplaceSession + '_>> {
        let staged = self.state.read().await.rows.clone();
        Ok(Box::new(MemoryReplaceSession {
            store: self,
            staged,
        }))
    }

    async fn close(&self) {}
}

struct MemoryReplaceSession<'a> {
    store: &'a MemoryEmployeeStore,
    staged: Vec<Employee>,
}

#[async_trait]
impl ReplaceSession for MemoryReplaceSession<'_> {
    async fn clear(&mut self) -> StoreResult<u64> {
        if self.store.state.read().await.fail_clear {
            return Err(StoreError::Backend("clear rejected".to_string()));
        }
        let removed = self.staged.len() as u64;
        self.staged.clear();
        Ok(removed)
    }

    async fn insert(&mut self, employee: &NewEmployee) -> StoreResult<Employee> {
        self.store.state.read().await.check_writable(&employee.empcode)?;
        insert_row(&mut self.staged, employee)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryReplaceSession { store, staged } = *self;
        store.state.write().await.rows = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeStatus, Role};

    fn new_employee(code: &str, name: &str, position: &str) -> NewEmployee {
        NewEmployee {
            no: 0,
            empcode: code.into(),
            first_name: name.into(),
            middle_name: None,
            last_name: "Santos".into(),
            full_name: format!("{name} Santos"),
            cbe_noncbe: None,
            rank: "Staff".into(),
            emp_status: "Regular".into(),
            position: position.into(),
            costcode: None,
            proj_name: "Depot".into(),
            proj_hr: None,
            email_address: None,
            mobile_assignment: None,
            mobile_number: None,
            laptop_assignment: None,
            asset_code: None,
            others: None,
            remarks: None,
            role: Role::Employee,
            status: EmployeeStatus::Active,
        }
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = MemoryEmployeeStore::new();
        store.create(&new_employee("E1", "Ana", "Clerk")).await.unwrap();
        let err = store
            .create(&new_employee("E1", "Ben", "Clerk"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey("E1".into()));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sort_desc_keeps_insertion_order_for_ties() {
        let store = MemoryEmployeeStore::new();
        store.create(&new_employee("E1", "Ana", "Clerk")).await.unwrap();
        store.create(&new_employee("E2", "Ben", "Welder")).await.unwrap();
        store.create(&new_employee("E3", "Cy", "Clerk")).await.unwrap();

        let spec = SortSpec {
            field: EmployeeField::Position,
            order: SortOrder::Desc,
        };
        let codes: Vec<String> = store
            .find_all(&EmployeeFilters::default(), Some(spec), None)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.empcode)
            .collect();
        assert_eq!(codes, vec!["E2", "E1", "E3"]);
    }

    async fn sorted_codes(store: &MemoryEmployeeStore, field: EmployeeField) -> Vec<String> {
        store
            .find_all(
                &EmployeeFilters::default(),
                Some(SortSpec { field, order: SortOrder::Asc }),
                None,
            )
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.empcode)
            .collect()
    }

    #[tokio::test]
    async fn text_sort_ignores_case_and_puts_null_first() {
        let store = MemoryEmployeeStore::new();
        let mut ben = new_employee("E1", "Ben", "Clerk");
        ben.full_name = "Ben Cruz".into();
        ben.remarks = Some("b".into());
        let mut ana = new_employee("E2", "ana", "Clerk");
        ana.full_name = "ana reyes".into();
        let mut carl = new_employee("E3", "Carl", "Clerk");
        carl.full_name = "Carl Tan".into();
        carl.remarks = Some("A".into());
        for e in [&ben, &ana, &carl] {
            store.create(e).await.unwrap();
        }

        assert_eq!(sorted_codes(&store, EmployeeField::FullName).await, vec!["E2", "E1", "E3"]);
        assert_eq!(sorted_codes(&store, EmployeeField::Remarks).await, vec!["E2", "E3", "E1"]);
    }

    #[tokio::test]
    async fn dropped_replace_session_changes_nothing() {
        let store = MemoryEmployeeStore::new();
        store.create(&new_employee("E1", "Ana", "Clerk")).await.unwrap();
        {
            let mut session = store.begin_replace().await.unwrap();
            session.clear().await.unwrap();
            session
                .insert(&new_employee("E9", "Zed", "Clerk"))
                .await
                .unwrap();
        }
        let rows = store.list_full().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].empcode, "E1");
    }
}
