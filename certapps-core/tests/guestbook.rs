//! Guestbook listing and signing against the in-memory store.

use certapps_core::{Identity, TestHarness};
use datastore::{StoreConfig, StoreError, StoreOp};
use std::time::Duration;

#[tokio::test]
async fn test_anonymous_greeting_is_listed() {
    let harness = TestHarness::new();
    let guestbook = harness.app.guestbook();

    guestbook.append("hello", None).await.unwrap();
    let greetings = guestbook.list().await.unwrap();

    assert_eq!(greetings.len(), 1);
    assert_eq!(greetings[0].content, "hello");
    assert_eq!(greetings[0].author, "");
    assert!(greetings[0].is_anonymous());
}

#[tokio::test]
async fn test_signed_in_author_is_display_form() {
    let harness = TestHarness::new();
    let identity = Identity::new("185804764220139124118", "test@example.com");

    harness
        .app
        .guestbook()
        .append("signed", Some(&identity))
        .await
        .unwrap();
    let greetings = harness.app.guestbook().list().await.unwrap();

    assert_eq!(greetings[0].author, "test@example.com");
}

#[tokio::test]
async fn test_most_recent_first_and_capped() {
    let harness = TestHarness::new();
    let guestbook = harness.app.guestbook();

    for i in 0..12 {
        guestbook.append(&format!("greeting {i}"), None).await.unwrap();
    }
    let greetings = guestbook.list().await.unwrap();

    assert_eq!(greetings.len(), 10);
    assert_eq!(greetings[0].content, "greeting 11");
    assert_eq!(greetings[9].content, "greeting 2");
    assert!(greetings.windows(2).all(|w| w[0].date >= w[1].date));
}

#[tokio::test]
async fn test_empty_content_is_stored() {
    let harness = TestHarness::new();
    harness.app.guestbook().append("", None).await.unwrap();

    let greetings = harness.app.guestbook().list().await.unwrap();
    assert_eq!(greetings.len(), 1);
    assert_eq!(greetings[0].content, "");
}

#[tokio::test(start_paused = true)]
async fn test_listing_sees_append_despite_replication_lag() {
    let harness =
        TestHarness::with_store_config(StoreConfig::new().with_eventual_delay(Duration::from_secs(5)));

    let key = harness.app.guestbook().append("fresh", None).await.unwrap();
    assert_eq!(key.parent(), Some(harness.app.guestbook().key()));

    let greetings = harness.app.guestbook().list().await.unwrap();
    assert_eq!(greetings.len(), 1);
}

#[tokio::test]
async fn test_guestbooks_are_isolated() {
    let a = TestHarness::new();
    let b = TestHarness::new();

    a.app.guestbook().append("only in a", None).await.unwrap();
    assert!(b.app.guestbook().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_surfaces() {
    let harness = TestHarness::new();
    harness.store.fail_next(StoreOp::Put, 1);

    let err = harness.app.guestbook().append("lost", None).await.unwrap_err();
    assert!(matches!(
        err,
        certapps_core::AppError::Store(StoreError::Transient { .. })
    ));
    assert!(harness.app.guestbook().list().await.unwrap().is_empty());
}
