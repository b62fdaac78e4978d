use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_alert_echoes_monitor_state() {
    let mut app = MockApp::new();
    for rssi in [-85, -90, -95] {
        app.advertise(rssi);
    }

    let (status, body) = app
        .post(
            "/api/alert",
            Some(json!({ "source": "dashboard", "note": "checking gate 3" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ok"], json!(true));

    let logged = &body["logged"];
    assert_eq!(logged["source"], json!("dashboard"));
    assert_eq!(logged["note"], json!("checking gate 3"));
    assert_eq!(logged["rssi"], json!(-95));
    assert_eq!(logged["avg_rssi"], json!(-90.0));
    assert_eq!(logged["status"], json!("warning"));
    assert!(logged["ts"].is_string());
}

#[tokio::test]
async fn test_alert_without_body_uses_defaults() {
    let app = MockApp::new();

    let (status, body) = app.post("/api/alert", None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["logged"]["source"], json!("web"));
    assert_eq!(body["logged"]["note"], json!(""));
    assert_eq!(body["logged"]["status"], json!("unknown"));
}

#[tokio::test]
async fn test_alert_leaves_monitor_untouched() {
    let mut app = MockApp::new();
    app.advertise(-70);
    let (_, before) = app.get("/api/monitor").await;

    app.post("/api/alert", Some(json!({ "note": "false alarm" })))
        .await;

    let (_, after) = app.get("/api/monitor").await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_alerts_listed_in_order() {
    let app = MockApp::new();
    app.post("/api/alert", Some(json!({ "note": "one" }))).await;
    app.post("/api/alert", Some(json!({ "note": "two" }))).await;

    let (status, body) = app.get("/api/alerts").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["note"], json!("one"));
    assert_eq!(body[1]["note"], json!("two"));
    assert_eq!(app.alert_log.list().await.len(), 2);
}
