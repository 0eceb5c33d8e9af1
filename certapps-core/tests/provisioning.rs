//! Member provisioning: the three-write protocol and its failure modes.

use certapps_core::model::{Location, Member};
use certapps_core::TestHarness;
use datastore::{DatastoreExt, Entity, StoreConfig, StoreOp};
use std::time::Duration;

#[tokio::test]
async fn test_first_request_creates_member_and_location() {
    let harness = TestHarness::new();
    let identity = TestHarness::identity("u1");

    let provisioned = harness.app.members().find_or_create(&identity).await.unwrap();

    assert!(provisioned.created);
    assert!(provisioned.key.is_complete());
    assert_eq!(harness.store.count(Member::KIND).await, 1);
    assert_eq!(harness.store.count(Location::KIND).await, 1);

    let stored: Member = harness.store.get_entity(&provisioned.key).await.unwrap();
    assert_eq!(stored.user_id, "u1");
    assert_eq!(stored.audit.created_by, Some(provisioned.key.clone()));
    assert_eq!(stored.audit.modified_by, Some(provisioned.key.clone()));

    let (_, location) = harness
        .app
        .members()
        .resolve_home_address(&stored)
        .await
        .unwrap()
        .expect("home address set");
    assert_eq!(location.audit.created_by, Some(provisioned.key.clone()));
    assert_eq!(location.address.line1, "123 Main St");
}

#[tokio::test]
async fn test_repeat_request_reuses_member() {
    let harness = TestHarness::new();
    let identity = TestHarness::identity("u1");

    let first = harness.app.members().find_or_create(&identity).await.unwrap();
    let second = harness.app.members().find_or_create(&identity).await.unwrap();

    assert!(!second.created);
    assert_eq!(second.key, first.key);
    assert_eq!(second.member.home_address, first.member.home_address);
    assert_eq!(harness.store.count(Member::KIND).await, 1);
    assert_eq!(harness.store.count(Location::KIND).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_repeat_request_reuses_member_during_replication_lag() {
    let harness = TestHarness::with_store_config(
        StoreConfig::new().with_eventual_delay(Duration::from_millis(500)),
    );
    let identity = TestHarness::identity("u1");

    let first = harness.app.members().find_or_create(&identity).await.unwrap();
    let second = harness.app.members().find_or_create(&identity).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(second.key, first.key);
    assert_eq!(second.member.home_address, first.member.home_address);
    assert_eq!(harness.store.count(Member::KIND).await, 1);
    assert_eq!(harness.store.count(Location::KIND).await, 1);
}

#[tokio::test]
async fn test_distinct_identities_get_distinct_members() {
    let harness = TestHarness::new();

    let a = harness
        .app
        .members()
        .find_or_create(&TestHarness::identity("a"))
        .await
        .unwrap();
    let b = harness
        .app
        .members()
        .find_or_create(&TestHarness::identity("b"))
        .await
        .unwrap();

    assert_ne!(a.key, b.key);
    assert_eq!(harness.store.count(Member::KIND).await, 2);
}

#[tokio::test]
async fn test_location_write_failure_leaves_member_without_location() {
    let harness = TestHarness::new();
    let identity = TestHarness::identity("u1");
    harness.store.fail_after(StoreOp::Put, 1, 1);

    assert!(harness.app.members().find_or_create(&identity).await.is_err());

    assert_eq!(harness.store.count(Member::KIND).await, 1);
    assert_eq!(harness.store.count(Location::KIND).await, 0);
    let (_, member) = harness.app.members().find(&identity).await.unwrap().unwrap();
    assert!(member.home_address.is_none());
    assert!(member.audit.is_bootstrap());
}

#[tokio::test]
async fn test_final_write_failure_leaves_orphan_location() {
    let harness = TestHarness::new();
    let identity = TestHarness::identity("u1");
    harness.store.fail_after(StoreOp::Put, 2, 1);

    assert!(harness.app.members().find_or_create(&identity).await.is_err());

    assert_eq!(harness.store.count(Member::KIND).await, 1);
    assert_eq!(harness.store.count(Location::KIND).await, 1);
    let (_, member) = harness.app.members().find(&identity).await.unwrap().unwrap();
    assert!(member.home_address.is_none());

    // The partial member is found and reused; nothing repairs it.
    let again = harness.app.members().find_or_create(&identity).await.unwrap();
    assert!(!again.created);
    assert!(again.member.home_address.is_none());
}

#[tokio::test]
async fn test_lookup_failure_creates_nothing() {
    let harness = TestHarness::new();
    harness.store.fail_next(StoreOp::GetAll, 1);

    let result = harness
        .app
        .members()
        .find_or_create(&TestHarness::identity("u1"))
        .await;

    assert!(result.is_err());
    assert_eq!(harness.store.count(Member::KIND).await, 0);
    assert_eq!(harness.store.count(Location::KIND).await, 0);
}

#[tokio::test]
async fn test_first_write_failure_creates_nothing() {
    let harness = TestHarness::new();
    harness.store.fail_next(StoreOp::Put, 1);

    let result = harness
        .app
        .members()
        .find_or_create(&TestHarness::identity("u1"))
        .await;

    assert!(result.is_err());
    assert_eq!(harness.store.count(Member::KIND).await, 0);
}
