// tests/reconcile.rs

mod common;

use std::sync::Arc;

use common::new_employee;
use masterdata_api::models::EmployeeFilters;
use masterdata_api::reconcile::{DuplicateEntry, Reconciler};
use masterdata_api::store::{EmployeeStore, MemoryEmployeeStore};

fn setup() -> (Arc<MemoryEmployeeStore>, Reconciler) {
    let store = Arc::new(MemoryEmployeeStore::new());
    let shared: Arc<dyn EmployeeStore> = store.clone();
    (store, Reconciler::new(shared))
}

async fn codes(store: &MemoryEmployeeStore) -> Vec<String> {
    store
        .find_all(&EmployeeFilters::default(), None, None)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.empcode)
        .collect()
}

#[tokio::test]
async fn import_keeps_first_of_duplicate_codes() {
    let (store, reconciler) = setup();

    let report = reconciler
        .import(vec![
            new_employee("A", "Ana", "Reyes"),
            new_employee("B", "Ben", "Cruz"),
            new_employee("A", "Amy", "Lopez"),
        ])
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        report.duplicates,
        vec![DuplicateEntry { empcode: "A".into(), full_name: "Amy Lopez".into() }]
    );

    let a = store.find_by_id("A").await.unwrap().unwrap();
    assert_eq!(a.first_name, "Ana");
    assert_eq!(a.last_name, "Reyes");
}

#[tokio::test]
async fn import_replaces_everything() {
    let (store, reconciler) = setup();
    store.create(&new_employee("OLD1", "Old", "One")).await.unwrap();
    store.create(&new_employee("OLD2", "Old", "Two")).await.unwrap();

    let report = reconciler
        .import(vec![new_employee("N1", "New", "One")])
        .await
        .unwrap();

    assert_eq!(report.removed, 2);
    assert_eq!(report.created, 1);
    assert_eq!(codes(&store).await, vec!["N1"]);
}

#[tokio::test]
async fn import_skips_a_failing_row_and_keeps_going() {
    let (store, reconciler) = setup();
    store.fail_writes_for("B").await;

    let report = reconciler
        .import(vec![
            new_employee("A", "Ana", "Reyes"),
            new_employee("B", "Ben", "Cruz"),
            new_employee("C", "Cy", "Tan"),
        ])
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].empcode, "B");
    assert_eq!(codes(&store).await, vec!["A", "C"]);
}

#[tokio::test]
async fn failed_clear_aborts_and_keeps_previous_data() {
    let (store, reconciler) = setup();
    store.create(&new_employee("KEEP", "Kim", "Sy")).await.unwrap();
    store.fail_clear(true).await;

    let result = reconciler
        .import(vec![new_employee("N1", "New", "One")])
        .await;

    assert!(result.is_err());
    assert_eq!(codes(&store).await, vec!["KEEP"]);
}

#[tokio::test]
async fn update_preserves_records_missing_from_the_sheet() {
    let (store, reconciler) = setup();
    store.create(&new_employee("A", "Ana", "Reyes")).await.unwrap();
    store.create(&new_employee("B", "Ben", "Cruz")).await.unwrap();
    let a_before = store.find_by_id("A").await.unwrap().unwrap();

    let mut b = new_employee("B", "Ben", "Cruz");
    b.position = "Foreman".into();
    b.remarks = Some("promoted".into());
    let report = reconciler
        .update(vec![b, new_employee("C", "Cy", "Tan")])
        .await;

    assert_eq!(report.updated, vec!["B"]);
    assert_eq!(report.inserted, vec!["C"]);
    assert_eq!(report.skipped, 0);

    let a_after = store.find_by_id("A").await.unwrap().unwrap();
    assert_eq!(a_before, a_after);

    let b_after = store.find_by_id("B").await.unwrap().unwrap();
    assert_eq!(b_after.position, "Foreman");
    assert_eq!(b_after.remarks.as_deref(), Some("promoted"));
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn update_clears_optional_fields_the_sheet_leaves_empty() {
    let (store, reconciler) = setup();
    let mut a = new_employee("A", "Ana", "Reyes");
    a.remarks = Some("old note".into());
    store.create(&a).await.unwrap();

    reconciler.update(vec![new_employee("A", "Ana", "Reyes")]).await;

    let after = store.find_by_id("A").await.unwrap().unwrap();
    assert_eq!(after.remarks, None);
}

#[tokio::test]
async fn update_twice_inserts_nothing_new() {
    let (store, reconciler) = setup();
    let sheet = vec![
        new_employee("A", "Ana", "Reyes"),
        new_employee("B", "Ben", "Cruz"),
    ];

    let first = reconciler.update(sheet.clone()).await;
    assert_eq!(first.inserted.len(), 2);

    let second = reconciler.update(sheet).await;
    assert!(second.inserted.is_empty());
    assert_eq!(second.updated, vec!["A", "B"]);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn update_survives_a_failing_row() {
    let (store, reconciler) = setup();
    store.create(&new_employee("B", "Ben", "Cruz")).await.unwrap();
    store.fail_writes_for("B").await;

    let report = reconciler
        .update(vec![
            new_employee("A", "Ana", "Reyes"),
            new_employee("B", "Ben", "Cruz"),
            new_employee("C", "Cy", "Tan"),
        ])
        .await;

    assert_eq!(report.inserted, vec!["A", "C"]);
    assert!(report.updated.is_empty());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures[0].empcode, "B");
}

#[tokio::test]
async fn duplicate_accounting_matches_multiplicities() {
    let (_store, reconciler) = setup();
    // A x3, B x2, C x1: six rows, three codes
    let rows = vec![
        new_employee("A", "A1", "X"),
        new_employee("B", "B1", "X"),
        new_employee("A", "A2", "X"),
        new_employee("C", "C1", "X"),
        new_employee("B", "B2", "X"),
        new_employee("A", "A3", "X"),
    ];

    let report = reconciler.update(rows).await;
    assert_eq!(report.skipped, 3);
    assert_eq!(report.duplicates.len(), 3);
    assert_eq!(report.inserted, vec!["A", "B", "C"]);
}
