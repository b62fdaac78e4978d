use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tinytrace_api::models::MonitorSnapshot;

use crate::services::MonitorReader;

#[derive(Clone)]
pub struct MonitorState {
    pub reader: MonitorReader,
}

pub fn monitor_router(monitor_state: MonitorState) -> Router {
    Router::new()
        .route("/api/monitor", get(get_monitor))
        .route("/api/rssi", get(get_monitor))
        .with_state(monitor_state)
}

#[utoipa::path(
    get,
    path = "/api/monitor",
    tag = "monitor",
    responses(
        (status = 200, description = "Latest published monitor state", body = MonitorSnapshot)
    )
)]
pub async fn get_monitor(State(state): State<MonitorState>) -> Json<MonitorSnapshot> {
    Json(state.reader.snapshot())
}
