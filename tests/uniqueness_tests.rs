//! Uniqueness-under-soft-delete lifecycle tests
//!
//! The same discipline applies to every entity with a natural key: creating
//! a duplicate of an Active row fails; soft-deleting releases the key;
//! recreating after deletion succeeds as a wholly new identity; history
//! accumulates rather than being resurrected or merged. The template below
//! runs that lifecycle against each entity registration.

use vigil::prelude::*;

/// Run the shared lifecycle against one entity type.
///
/// `make` produces a fresh, unsaved row carrying the same natural key every
/// time. The three filters select the Active, the combined and the Deleted
/// populations for that key.
async fn assert_uniqueness_lifecycle<T, F>(
    store: InMemoryStore<T>,
    make: F,
    active: T::Filter,
    all: T::Filter,
    deleted: T::Filter,
) where
    T: Record + std::fmt::Debug,
    F: Fn() -> T,
{
    // create(K) succeeds once
    let first = store.create(make()).await.expect("first create succeeds");

    // create(K) again while the first is Active fails and leaves exactly
    // one Active row
    let err = store.create(make()).await.expect_err("duplicate rejected");
    assert!(matches!(err, VigilError::Constraint(_)));
    assert_eq!(store.count(&active).await.unwrap(), 1);
    assert_eq!(store.count(&all).await.unwrap(), 1);

    // delete(first) then create(K) succeeds: two rows total, one Deleted
    store.delete(first.id()).await.expect("delete succeeds");
    let second = store.create(make()).await.expect("recreate succeeds");
    assert_ne!(second.id(), first.id(), "recreation is a new identity");
    assert_eq!(store.count(&active).await.unwrap(), 1);
    assert_eq!(store.count(&all).await.unwrap(), 2);
    assert_eq!(store.count(&deleted).await.unwrap(), 1);

    // deleting the successor counts both rows as Deleted
    store.delete(second.id()).await.expect("second delete succeeds");
    assert_eq!(store.count(&active).await.unwrap(), 0);
    assert_eq!(store.count(&all).await.unwrap(), 2);
    assert_eq!(store.count(&deleted).await.unwrap(), 2);

    // one more round: three rows total, two Deleted, one Active
    let third = store.create(make()).await.expect("third create succeeds");
    assert_ne!(third.id(), second.id());
    assert_eq!(store.count(&active).await.unwrap(), 1);
    assert_eq!(store.count(&all).await.unwrap(), 3);
    assert_eq!(store.count(&deleted).await.unwrap(), 2);
}

#[tokio::test]
async fn issue_uniqueness_lifecycle() {
    let name = vec!["CVE-2021-44228".to_string()];
    assert_uniqueness_lifecycle(
        InMemoryStore::<Issue>::new(),
        || Issue::new("CVE-2021-44228", IssueType::Vulnerability, "log4shell"),
        IssueFilter {
            primary_name: name.clone(),
            ..Default::default()
        },
        IssueFilter {
            primary_name: name.clone(),
            state: vec![StateFilter::Active, StateFilter::Deleted],
            ..Default::default()
        },
        IssueFilter {
            primary_name: name.clone(),
            state: vec![StateFilter::Deleted],
            ..Default::default()
        },
    )
    .await;
}

#[tokio::test]
async fn service_uniqueness_lifecycle() {
    let ccrn = vec!["ccrn:payments-gateway".to_string()];
    assert_uniqueness_lifecycle(
        InMemoryStore::<Service>::new(),
        || Service::new("ccrn:payments-gateway"),
        ServiceFilter {
            ccrn: ccrn.clone(),
            ..Default::default()
        },
        ServiceFilter {
            ccrn: ccrn.clone(),
            state: vec![StateFilter::Active, StateFilter::Deleted],
            ..Default::default()
        },
        ServiceFilter {
            ccrn: ccrn.clone(),
            state: vec![StateFilter::Deleted],
            ..Default::default()
        },
    )
    .await;
}

#[tokio::test]
async fn component_version_uniqueness_lifecycle() {
    let component = vec![42i64];
    let version = vec!["2.17.0".to_string()];
    assert_uniqueness_lifecycle(
        InMemoryStore::<ComponentVersion>::new(),
        || ComponentVersion::new(42, "2.17.0", "ghcr.io/apache/logging"),
        ComponentVersionFilter {
            component_id: component.clone(),
            version: version.clone(),
            ..Default::default()
        },
        ComponentVersionFilter {
            component_id: component.clone(),
            version: version.clone(),
            state: vec![StateFilter::Active, StateFilter::Deleted],
            ..Default::default()
        },
        ComponentVersionFilter {
            component_id: component.clone(),
            version: version.clone(),
            state: vec![StateFilter::Deleted],
            ..Default::default()
        },
    )
    .await;
}

#[tokio::test]
async fn natural_key_scopes_to_the_parent_for_component_versions() {
    let store = InMemoryStore::<ComponentVersion>::new();
    store
        .create(ComponentVersion::new(1, "3.0.0", "r"))
        .await
        .unwrap();

    // Same version under a different component is a different key.
    store
        .create(ComponentVersion::new(2, "3.0.0", "r"))
        .await
        .expect("same version under another component is allowed");

    let err = store
        .create(ComponentVersion::new(1, "3.0.0", "r"))
        .await
        .expect_err("same (component, version) pair is rejected");
    assert!(matches!(err, VigilError::Constraint(_)));
}

#[tokio::test]
async fn update_cannot_steal_an_active_natural_key() {
    let store = InMemoryStore::<Issue>::new();
    store
        .create(Issue::new("CVE-2014-0160", IssueType::Vulnerability, "heartbleed"))
        .await
        .unwrap();
    let victim = store
        .create(Issue::new("CVE-2014-6271", IssueType::Vulnerability, "shellshock"))
        .await
        .unwrap();

    let mut renamed = victim.clone();
    renamed.primary_name = "CVE-2014-0160".to_string();
    let err = store.update(renamed).await.expect_err("collision rejected");
    assert!(matches!(err, VigilError::Constraint(_)));

    // The victim row is unchanged.
    let fetched = store.get(victim.id).await.unwrap().unwrap();
    assert_eq!(fetched.primary_name, "CVE-2014-6271");
}

#[tokio::test]
async fn deleted_rows_do_not_block_unrelated_keys() {
    let store = InMemoryStore::<Service>::new();
    let a = store.create(Service::new("ccrn:auth")).await.unwrap();
    store.delete(a.id).await.unwrap();

    // A fresh key is unaffected by the deleted row's history.
    store.create(Service::new("ccrn:ledger")).await.unwrap();
    // And the released key is reusable immediately.
    store.create(Service::new("ccrn:auth")).await.unwrap();

    let all = ServiceFilter {
        state: vec![StateFilter::Active, StateFilter::Deleted],
        ..Default::default()
    };
    assert_eq!(store.count(&all).await.unwrap(), 3);
}
