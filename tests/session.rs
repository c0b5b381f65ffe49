mod common;

use std::time::Duration;

use serde_json::json;

use awesome_snippets::client::ApiClient;
use awesome_snippets::core::helpers::now_epoch;
use awesome_snippets::session::{SessionError, SessionStore};

use common::{config_for, token_pair, MockBackend};

const ACCESS_LIFETIME: i64 = 45 * 60;
const REFRESH_LIFETIME: i64 = 6 * 24 * 60 * 60;

#[actix_web::test]
async fn concurrent_reads_share_one_refresh() {
    let mock = MockBackend::start().await;
    mock.on_delayed(
        "POST",
        "auth/token/refresh/",
        200,
        json!({"access": "access-2", "refresh": "refresh-2"}),
        Some(Duration::from_millis(200)),
    );
    let api = ApiClient::new(&config_for(&mock)).unwrap();
    let store = SessionStore::new(ACCESS_LIFETIME, REFRESH_LIFETIME);
    let session = store.start(token_pair("access-1", "ana"), now_epoch() - ACCESS_LIFETIME - 60);

    let (a, b, c) = tokio::join!(
        store.read(&session.id, &api),
        store.read(&session.id, &api),
        store.read(&session.id, &api),
    );

    for read in [a, b, c] {
        let current = read.unwrap().unwrap();
        assert_eq!(current.access_token, "access-2");
        assert_eq!(current.refresh_token, "refresh-2");
        assert!(current.expires_at > now_epoch());
    }
    assert_eq!(mock.hits_for("POST", "auth/token/refresh/").len(), 1);

    let sent: serde_json::Value = serde_json::from_str(&mock.hits()[0].body).unwrap();
    assert_eq!(sent, json!({"refresh": "refresh-access-1"}));
    mock.stop().await;
}

#[actix_web::test]
async fn fresh_session_is_read_without_backend_calls() {
    let mock = MockBackend::start().await;
    let api = ApiClient::new(&config_for(&mock)).unwrap();
    let store = SessionStore::new(ACCESS_LIFETIME, REFRESH_LIFETIME);
    let session = store.start(token_pair("access-1", "ana"), now_epoch());

    let current = store.read(&session.id, &api).await.unwrap().unwrap();
    assert_eq!(current.access_token, "access-1");
    assert_eq!(current.username(), "ana");
    assert!(store.read("no-such-session", &api).await.unwrap().is_none());
    assert!(mock.hits().is_empty());
    mock.stop().await;
}

#[actix_web::test]
async fn concurrent_reads_after_failed_refresh_all_see_expiry() {
    let mock = MockBackend::start().await;
    mock.on_delayed(
        "POST",
        "auth/token/refresh/",
        401,
        json!({"detail": "Token is invalid or expired"}),
        Some(Duration::from_millis(100)),
    );
    let api = ApiClient::new(&config_for(&mock)).unwrap();
    let store = SessionStore::new(ACCESS_LIFETIME, REFRESH_LIFETIME);
    let session = store.start(token_pair("access-1", "ana"), now_epoch() - ACCESS_LIFETIME - 60);

    let (a, b) = tokio::join!(store.read(&session.id, &api), store.read(&session.id, &api));
    assert!(matches!(a, Err(SessionError::RefreshFailed(_))));
    assert!(matches!(b, Err(SessionError::Expired)));
    assert!(store.is_empty());
    assert_eq!(mock.hits_for("POST", "auth/token/refresh/").len(), 1);
    mock.stop().await;
}

#[actix_web::test]
async fn lapsed_refresh_token_drops_session_without_calls() {
    let mock = MockBackend::start().await;
    let api = ApiClient::new(&config_for(&mock)).unwrap();
    let store = SessionStore::new(ACCESS_LIFETIME, REFRESH_LIFETIME);
    let session = store.start(token_pair("access-1", "ana"), now_epoch() - REFRESH_LIFETIME - 1);

    assert!(matches!(store.read(&session.id, &api).await, Err(SessionError::Expired)));
    assert!(store.is_empty());
    assert!(mock.hits().is_empty());
    mock.stop().await;
}

#[actix_web::test]
async fn end_removes_session() {
    let store = SessionStore::new(ACCESS_LIFETIME, REFRESH_LIFETIME);
    let session = store.start(token_pair("access-1", "ana"), now_epoch());
    assert_eq!(store.len(), 1);
    assert!(store.end(&session.id));
    assert!(!store.end(&session.id));
    assert!(store.is_empty());
}

#[actix_web::test]
async fn starting_a_session_sweeps_lapsed_ones() {
    let store = SessionStore::new(ACCESS_LIFETIME, REFRESH_LIFETIME);
    let stale = store.start(token_pair("access-1", "ana"), now_epoch() - REFRESH_LIFETIME - 1);
    let idle = store.start(token_pair("access-2", "bob"), now_epoch() - ACCESS_LIFETIME - 60);
    assert_eq!(store.len(), 1);

    let fresh = store.start(token_pair("access-3", "cy"), now_epoch());
    assert_eq!(store.len(), 2);
    assert!(!store.end(&stale.id));
    assert!(store.end(&idle.id));
    assert!(store.end(&fresh.id));
}
