use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tinytrace_api::models::{AlertRecord, AlertRequest, AlertResponse};

use crate::services::{AlertLog, MonitorReader};

#[derive(Clone)]
pub struct AlertState {
    pub reader: MonitorReader,
    pub alert_log: AlertLog,
}

pub fn alert_router(alert_state: AlertState) -> Router {
    Router::new()
        .route("/api/alert", post(create_alert))
        .route("/api/alerts", get(get_alerts))
        .with_state(alert_state)
}

#[utoipa::path(
    post,
    path = "/api/alert",
    tag = "alert",
    request_body = AlertRequest,
    responses(
        (status = 201, description = "Alert logged with the current monitor state", body = AlertResponse)
    )
)]
pub async fn create_alert(
    State(state): State<AlertState>,
    body: Option<Json<AlertRequest>>,
) -> (StatusCode, Json<AlertResponse>) {
    // A missing or malformed body still logs an alert with defaults
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let snapshot = state.reader.snapshot();

    let logged = state.alert_log.record(request, &snapshot).await;

    (StatusCode::CREATED, Json(AlertResponse { ok: true, logged }))
}

#[utoipa::path(
    get,
    path = "/api/alerts",
    tag = "alert",
    responses(
        (status = 200, description = "Alerts logged since startup, oldest first", body = Vec<AlertRecord>)
    )
)]
pub async fn get_alerts(State(state): State<AlertState>) -> Json<Vec<AlertRecord>> {
    Json(state.alert_log.list().await)
}
