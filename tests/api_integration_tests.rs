//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint, with the map backed
//! by an in-memory shared store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use shared_map::{api::create_router, AppState, DistributedMap, JsonCodec, MapConfig, MemoryStore};
use tower::ServiceExt;

// == Helper Functions ==

async fn create_test_app(store: Arc<MemoryStore>, limit: usize) -> Router {
    let map = DistributedMap::connect(MapConfig::new("api", limit), store, JsonCodec::new())
        .await
        .unwrap();
    create_router(AppState::new(map))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn put_request(key: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/map/{}", key))
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == PUT Endpoint Tests ==

#[tokio::test]
async fn test_put_endpoint_success() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let response = app
        .oneshot(put_request("test_key", r#"{"value":"test_value"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert!(json["previous_local"].is_null());
}

#[tokio::test]
async fn test_put_endpoint_returns_previous_local() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let _ = app
        .clone()
        .oneshot(put_request("k", r#"{"value":{"n":1}}"#))
        .await
        .unwrap();
    let response = app
        .oneshot(put_request("k", r#"{"value":{"n":2}}"#))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["previous_local"]["n"].as_u64().unwrap(), 1);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let set_response = app
        .clone()
        .oneshot(put_request("get_key", r#"{"value":[1,2,3]}"#))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app
        .oneshot(empty_request("GET", "/map/get_key"))
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"].as_str().unwrap(), "get_key");
    assert_eq!(json["value"], serde_json::json!([1, 2, 3]));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let response = app
        .oneshot(empty_request("GET", "/map/nonexistent_key"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_get_sees_other_node_writes() {
    let store = Arc::new(MemoryStore::new());
    let node_a = create_test_app(store.clone(), 10).await;
    let node_b = create_test_app(store, 10).await;

    let _ = node_a
        .oneshot(put_request("shared", r#"{"value":"from a"}"#))
        .await
        .unwrap();

    let response = node_b
        .oneshot(empty_request("GET", "/map/shared"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["value"].as_str().unwrap(), "from a");
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let _ = app
        .clone()
        .oneshot(put_request("delete_key", r#"{"value":"delete_value"}"#))
        .await
        .unwrap();

    let del_response = app
        .clone()
        .oneshot(empty_request("DELETE", "/map/delete_key"))
        .await
        .unwrap();
    assert_eq!(del_response.status(), StatusCode::OK);
    let json = body_to_json(del_response.into_body()).await;
    assert_eq!(json["previous_local"].as_str().unwrap(), "delete_value");

    let get_response = app
        .oneshot(empty_request("GET", "/map/delete_key"))
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_absent_key_is_ok() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let response = app
        .oneshot(empty_request("DELETE", "/map/nonexistent_key"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["previous_local"].is_null());
}

// == Whole Map Tests ==

#[tokio::test]
async fn test_entries_and_local_endpoints() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 1).await;

    for (key, body) in [("a", r#"{"value":1}"#), ("b", r#"{"value":2}"#)] {
        let response = app.clone().oneshot(put_request(key, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/map"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"].as_u64().unwrap(), 2);
    assert_eq!(json["entries"]["b"].as_u64().unwrap(), 2);

    let response = app.oneshot(empty_request("GET", "/local")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"].as_u64().unwrap(), 1);
    assert_eq!(json["entries"]["a"].as_u64().unwrap(), 1);
}

#[tokio::test]
async fn test_clear_endpoint() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let _ = app
        .clone()
        .oneshot(put_request("a", r#"{"value":1}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/map"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(empty_request("GET", "/map")).await.unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"].as_u64().unwrap(), 0);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 1).await;

    let _ = app
        .clone()
        .oneshot(put_request("admitted", r#"{"value":"x"}"#))
        .await
        .unwrap();
    let _ = app
        .clone()
        .oneshot(put_request("refused", r#"{"value":"y"}"#))
        .await
        .unwrap();

    let response = app.oneshot(empty_request("GET", "/stats")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;

    assert_eq!(json["name"].as_str().unwrap(), "api");
    assert_eq!(json["local_key_limit"].as_u64().unwrap(), 1);
    assert_eq!(json["cache"]["admitted"].as_u64().unwrap(), 1);
    assert_eq!(json["cache"]["refused"].as_u64().unwrap(), 1);
    assert_eq!(json["cache"]["total_entries"].as_u64().unwrap(), 1);
    assert!(json["events"].get("events_published").is_some());
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let response = app
        .oneshot(put_request("k", r#"{"invalid json"#))
        .await
        .unwrap();

    // Axum returns 422 for JSON parsing errors by default
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_reserved_delimiter_in_value() {
    let app = create_test_app(Arc::new(MemoryStore::new()), 10).await;

    let response = app
        .oneshot(put_request("k", r#"{"value":"a<>b"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_store_unavailable() {
    let store = Arc::new(MemoryStore::new());
    let app = create_test_app(store.clone(), 10).await;

    store.set_unavailable(true);
    let response = app.oneshot(empty_request("GET", "/map/k")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
