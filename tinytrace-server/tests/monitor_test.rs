use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_monitor_starts_unknown() {
    let app = MockApp::new();

    let (status, body) = app.get("/api/monitor").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], json!(false));
    assert_eq!(body["status"], json!("unknown"));
    assert_eq!(body["latest_rssi"], json!(null));
    assert_eq!(body["window_size"], json!(3));
    assert_eq!(body["threshold"], json!(-80));
}

#[tokio::test]
async fn test_monitor_follows_window_average() {
    let mut app = MockApp::new();

    for rssi in [-70, -75, -90] {
        app.advertise(rssi);
    }
    let (_, body) = app.get("/api/monitor").await;
    assert_eq!(body["status"], json!("safe"));
    assert_eq!(body["latest_rssi"], json!(-90));
    assert!(body["last_update"].is_string());

    app.advertise(-95);
    let (_, body) = app.get("/api/monitor").await;
    assert_eq!(body["status"], json!("warning"));
    assert_eq!(body["enabled"], json!(true));
    assert!((body["average_rssi"].as_f64().unwrap() + 86.667).abs() < 0.01);

    // A single recovering sample flips straight back
    app.advertise(-40);
    let (_, body) = app.get("/api/monitor").await;
    assert_eq!(body["status"], json!("safe"));
}

#[tokio::test]
async fn test_repeated_polls_identical() {
    let mut app = MockApp::new();
    app.advertise(-72);

    let (_, first) = app.get("/api/monitor").await;
    let (_, second) = app.get("/api/monitor").await;
    let (_, alias) = app.get("/api/rssi").await;

    assert_eq!(first, second);
    assert_eq!(first, alias);
}

#[tokio::test]
async fn test_fault_is_published() {
    let mut app = MockApp::new();
    app.advertise(-72);
    app.publisher.publish_fault("bluetooth adapter unavailable: no bluetooth adapter found");

    let (_, body) = app.get("/api/monitor").await;

    assert_eq!(body["enabled"], json!(false));
    assert_eq!(body["status"], json!("unknown"));
    assert_eq!(body["latest_rssi"], json!(null));
    assert_eq!(body["average_rssi"], json!(null));
    assert_eq!(
        body["error"],
        json!("bluetooth adapter unavailable: no bluetooth adapter found")
    );
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = MockApp::new();

    let (status, body) = app.get("/api/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/monitor"].is_object());
    assert!(body["paths"]["/api/incidents/{incident_id}/confirm"].is_object());
}
