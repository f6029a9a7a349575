use std::sync::Arc;
use std::time::Duration;

use loupe::core::model::{Cursor, DetailEntry};
use loupe::service::{ErrorKind, HttpLogService, LogService, ServiceError, collect_pages};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Client pointed at the mock server, with a short timeout
fn service(server: &MockServer, token: Option<&str>) -> Arc<HttpLogService> {
    let endpoint = format!("{}/api", server.uri());
    Arc::new(
        HttpLogService::new(
            &endpoint,
            token.map(String::from),
            Duration::from_millis(500),
        )
        .unwrap(),
    )
}

/// The service blocks on the runtime, so calls go through the blocking pool
async fn call<T, F>(service: &Arc<HttpLogService>, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce(&HttpLogService) -> T + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .unwrap()
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_list_collections_follows_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "/db"}],
            "next_cursor": "page-2"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "/app", "name": "app"}],
            "next_cursor": "page-2"
        })))
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let collections = call(&svc, |s| {
        collect_pages(None, |cursor| s.list_collections(cursor))
    })
    .await;
    let collections = assert_ok!(collections);

    // The second page repeats its cursor, which ends the enumeration.
    let ids: Vec<_> = collections.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["/app", "/db"]);
    assert_eq!(collections[0].display_name(), "app");
    assert_eq!(collections[1].display_name(), "/db");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_items_encodes_group_and_orders_by_activity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections/%2Faws%2Flambda%2Ffn/items"))
        .and(query_param("order", "last_activity_desc"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": "2024/01/01/[$LATEST]abc", "last_activity": 1700000000000i64},
                {"id": "idle"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let page = call(&svc, |s| s.list_items("/aws/lambda/fn", None)).await;
    let page = assert_ok!(page);

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].last_activity, Some(1_700_000_000_000));
    assert_eq!(page.items[1].last_activity, None);
    assert!(page.next.is_none());
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_detail_page_direction_and_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections/app/items/web-1/entries"))
        .and(query_param("from", "latest"))
        .and(query_param("cursor", "f/123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"timestamp": 5, "message": "hello"}],
            "next_cursor": "f/124"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let page = call(&svc, |s| {
        s.detail_page("app", "web-1", Some(&Cursor::from("f/123")), false)
    })
    .await;
    let page = assert_ok!(page);

    assert_eq!(page.items, vec![DetailEntry::new(5, "hello")]);
    assert_eq!(page.next, Some(Cursor::from("f/124")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_detail_since_sends_timestamp() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections/app/items/web-1/entries"))
        .and(query_param("since", "1700000000123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"timestamp": 1700000000124i64, "message": "a"},
                {"timestamp": 1700000000125i64, "message": "b"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let entries = call(&svc, |s| s.detail_since("app", "web-1", 1_700_000_000_123)).await;
    let entries = assert_ok!(entries);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].message, "b");
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_ensure_item_treats_conflict_as_existing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/collections/app/items"))
        .and(body_json(json!({"id": "web-1"})))
        .respond_with(ResponseTemplate::new(409).set_body_string("already exists"))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, None);
    assert_ok!(call(&svc, |s| s.ensure_item("app", "web-1")).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_entries_posts_batch_with_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/collections/app/items/web-1/entries"))
        .and(header("authorization", "Bearer s3cret"))
        .and(body_json(json!({
            "entries": [{"timestamp": 10, "message": "deployed"}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service(&server, Some("s3cret"));
    let result = call(&svc, |s| {
        s.put_entries("app", "web-1", &[DetailEntry::new(10, "deployed")])
    })
    .await;
    assert_ok!(result);
}

// ============================================================================
// Error Mapping
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_is_authorization_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let svc = service(&server, Some("wrong"));
    let err = assert_err!(call(&svc, |s| s.list_collections(None)).await);
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(!err.is_transient());
    assert!(err.to_string().contains("bad token"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_stream_is_config_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections/app/items/gone/entries"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let err = assert_err!(call(&svc, |s| s.detail_page("app", "gone", None, true)).await);
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_errors_are_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let err = assert_err!(call(&svc, |s| s.list_collections(None)).await);
    assert!(err.is_transient());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"items": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let err = assert_err!(call(&svc, |s| s.list_collections(None)).await);
    assert!(matches!(err, ServiceError::Timeout));
    assert!(err.is_transient());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let svc = service(&server, None);
    let err = assert_err!(call(&svc, |s| s.list_collections(None)).await);
    assert!(matches!(err, ServiceError::Parse(_)));
}
