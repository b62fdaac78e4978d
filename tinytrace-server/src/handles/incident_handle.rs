use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tinytrace_api::models::IncidentId;
use tinytrace_cctv::DispatchHandle;

use crate::errors::{ApiError, IncidentError};

#[derive(Clone)]
pub struct IncidentState {
    /// `None` when no `[cctv]` section is configured or the detector failed to load
    pub dispatch: Option<DispatchHandle>,
}

pub fn incident_router(incident_state: IncidentState) -> Router {
    Router::new()
        .route("/api/incidents/:incident_id/confirm", post(confirm_incident))
        .with_state(incident_state)
}

#[utoipa::path(
    post,
    path = "/api/incidents/{incident_id}/confirm",
    tag = "incident",
    params(
        ("incident_id" = String, Path, description = "Incident ID")
    ),
    responses(
        (status = 202, description = "Confirmation worker scheduled"),
        (status = 400, description = "Invalid incident id"),
        (status = 503, description = "CCTV confirmation unavailable")
    )
)]
pub async fn confirm_incident(
    State(state): State<IncidentState>,
    Path(incident_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let incident_id = incident_id.trim();
    if incident_id.is_empty() {
        return Err(IncidentError::InvalidIncidentId.into());
    }

    let dispatch = state
        .dispatch
        .as_ref()
        .ok_or(IncidentError::ConfirmationUnavailable)?;

    dispatch
        .confirm(IncidentId::from(incident_id))
        .await
        .map_err(|_| IncidentError::ConfirmationStopped)?;

    tracing::info!(incident_id, "cctv confirmation requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "ok": true, "incident_id": incident_id })),
    ))
}
