//! Repair-status endpoint over an in-memory gateway
#![cfg(feature = "ssr")]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use repairdesk::backend::server::{create_router, AppState};
use repairdesk::shared::{EquipmentRow, GatewayError, MemoryGateway};

fn row(serial: &str, status: &str) -> EquipmentRow {
    EquipmentRow {
        id: Some(format!("id-{}", serial)),
        job_card_no: Some("COMETZ25/00042".into()),
        serial_number: Some(serial.into()),
        status: Some(status.into()),
        sr_number: Some("SR-7".into()),
        received_date: Some("2025-06-01T08:00:00+00:00".into()),
        ..Default::default()
    }
}

async fn get(gateway: Arc<MemoryGateway>, uri: &str) -> (StatusCode, Value) {
    let app = create_router(AppState::new(gateway));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn pending_device_is_in_repair() {
    let gateway = Arc::new(MemoryGateway::with_rows(vec![row("SN-1", "Pending")]));

    let (status, body) = get(gateway, "/api/external/repair-status/SN-1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "jobId": "COMETZ25/00042",
            "status": "Pending",
            "inRepair": true,
            "srNumber": "SR-7",
            "receivedDate": "2025-06-01T08:00:00+00:00"
        })
    );
}

#[tokio::test]
async fn collected_device_is_not_in_repair() {
    let gateway = Arc::new(MemoryGateway::with_rows(vec![row("SN-2", "Collected")]));

    let (status, body) = get(gateway, "/api/external/repair-status/SN-2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inRepair"], json!(false));
}

#[tokio::test]
async fn unknown_serial_is_404() {
    let gateway = Arc::new(MemoryGateway::new());

    let (status, body) = get(gateway, "/api/external/repair-status/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Equipment not found"}));
}

#[tokio::test]
async fn missing_serial_is_400() {
    let (status, body) = get(Arc::new(MemoryGateway::new()), "/api/external/repair-status/").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Serial number is required"}));
}

#[tokio::test]
async fn gateway_failure_is_500() {
    let gateway = Arc::new(MemoryGateway::new());
    gateway
        .fail_next(GatewayError::Server {
            status: 503,
            message: "down".into(),
        })
        .await;

    let (status, body) = get(gateway, "/api/external/repair-status/SN-1").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
}
