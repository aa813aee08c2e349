//! Integration tests for the API server.

use std::sync::OnceLock;

use api::InMemoryServices;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{Money, UserId};
use fulfillment::DispatchWorkerHandle;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderRepository;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    repository: InMemoryOrderRepository,
    services: InMemoryServices,
    worker: DispatchWorkerHandle,
}

fn setup() -> TestApp {
    let repository = InMemoryOrderRepository::new();
    let (state, worker, services) = api::create_default_state(repository.clone());
    let app = api::create_app(state, get_metrics_handle());
    TestApp {
        app,
        repository,
        services,
        worker,
    }
}

/// Cart of user 1 worth 25.00.
fn stock_cart(services: &InMemoryServices) {
    services.catalog.insert("p1", Money::from_cents(1000));
    services.catalog.insert("p2", Money::from_cents(500));
    services.cart.add_line(UserId::new(1), "p1", 2);
    services.cart.add_line(UserId::new(1), "p2", 1);
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let t = setup();
    let (status, json) = send(&t.app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_checkout_returns_pending_order() {
    let t = setup();
    stock_cart(&t.services);

    let (status, json) = send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 1);
    assert_eq!(json["user_id"], 1);
    assert_eq!(json["total"], 2500);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["line_items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_checkout_fans_out_with_callback_url() {
    let t = setup();
    stock_cart(&t.services);

    let (status, _) = send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;
    assert_eq!(status, StatusCode::OK);

    t.worker.shutdown().await;

    let services = &t.services;
    let payments = services.payment.initiations();
    assert_eq!(payments.len(), 1);
    assert_eq!(
        payments[0].callback_url,
        "http://localhost:8080/orders/callback"
    );
    assert_eq!(services.notification.sent_count(), 1);
    assert_eq!(services.queue.message_count(), 1);
    assert_eq!(services.event_bus.event_count(), 1);
}

#[tokio::test]
async fn test_checkout_empty_cart() {
    let t = setup();
    let (status, json) = send(&t.app, post_json("/orders", json!({"user_id": 5}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
    assert_eq!(t.repository.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_missing_user_id() {
    let t = setup();
    let (status, json) = send(&t.app, post_json("/orders", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_checkout_malformed_body() {
    let t = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, json) = send(&t.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_checkout_invalid_product() {
    let t = setup();
    t.services.catalog.insert("p1", Money::from_cents(1000));
    t.services.cart.add_line(UserId::new(1), "p1", 1);
    t.services.cart.add_line(UserId::new(1), "SKU-404", 1);

    let (status, json) = send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("SKU-404"));
    assert_eq!(t.repository.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_cart_unreachable() {
    let t = setup();
    t.services.cart.set_unreachable(true);

    let (status, _) = send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_checkout_storage_failure() {
    let t = setup();
    stock_cart(&t.services);
    t.repository.set_fail_on_write(true);

    let (status, json) = send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn test_get_order() {
    let t = setup();
    stock_cart(&t.services);
    send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;

    let (status, json) = send(&t.app, get("/orders/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 1);
    assert_eq!(json["total"], 2500);
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let t = setup();
    let (status, json) = send(&t.app, get("/orders/999")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn test_invalid_order_id_format() {
    let t = setup();
    let (status, _) = send(&t.app, get("/orders/not-a-number")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_orders_newest_first() {
    let t = setup();
    stock_cart(&t.services);
    for _ in 0..3 {
        send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;
    }

    let (status, json) = send(&t.app, get("/orders")).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_callback_success_then_duplicate() {
    let t = setup();
    stock_cart(&t.services);
    send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;

    let (status, json) = send(
        &t.app,
        post_json("/orders/callback", json!({"order_id": 1, "status": "success"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "success"}));

    let (status, json) = send(
        &t.app,
        post_json("/orders/callback", json!({"order_id": 1, "status": "failed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");

    let (_, order) = send(&t.app, get("/orders/1")).await;
    assert_eq!(order["status"], "paid");
}

#[tokio::test]
async fn test_callback_accepts_provider_field_name() {
    let t = setup();
    stock_cart(&t.services);
    send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;

    let (status, _) = send(
        &t.app,
        post_json(
            "/orders/callback",
            json!({"orderID": 1, "status": "failed", "message": "card declined"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, order) = send(&t.app, get("/orders/1")).await;
    assert_eq!(order["status"], "payment_failed");
}

#[tokio::test]
async fn test_callback_missing_order_id() {
    let t = setup();
    let (status, json) = send(
        &t.app,
        post_json("/orders/callback", json!({"status": "success"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("order_id"));
}

#[tokio::test]
async fn test_callback_unknown_order() {
    let t = setup();
    let (status, _) = send(
        &t.app,
        post_json("/orders/callback", json!({"order_id": 77, "status": "success"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup();
    stock_cart(&t.services);
    send(&t.app, post_json("/orders", json!({"user_id": 1}))).await;

    let response = t.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("orders_created_total"));
}
