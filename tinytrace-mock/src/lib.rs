use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tinytrace_api::models::CctvMatch;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::settings::Settings;
pub use crate::store::{IncidentStore, MockIncident};

pub mod settings;
mod store;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenIncidentBody {
    pub note: String,
}

pub fn router(store: IncidentStore) -> Router {
    Router::new()
        .route("/incidents", get(list_incidents).post(open_incident))
        .route("/incident/:id", get(get_incident))
        .route("/incident/:id/resolve", post(resolve_incident))
        .route("/incident/:id/cctv_match", post(record_cctv_match))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Serves the mock backend until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, store: IncidentStore, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn std::error::Error>> {
    let store = IncidentStore::new();
    for note in &settings.mock.seed_incidents {
        let incident = store.open(note.clone()).await;
        tracing::info!("seeded incident {} ({})", incident.id, incident.note);
    }

    let ip_addr = settings.mock.host.parse::<IpAddr>()?;
    let address = SocketAddr::from((ip_addr, settings.mock.port));
    let listener = TcpListener::bind(&address).await?;

    tracing::info!("mock incident backend listening on {:?}", address);

    serve(listener, store, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
    })
    .await?;

    Ok(())
}

async fn list_incidents(State(store): State<IncidentStore>) -> Json<Vec<MockIncident>> {
    Json(store.list().await)
}

async fn open_incident(
    State(store): State<IncidentStore>,
    Json(body): Json<OpenIncidentBody>,
) -> (StatusCode, Json<MockIncident>) {
    let incident = store.open(body.note).await;
    tracing::debug!("opened incident {}", incident.id);

    (StatusCode::CREATED, Json(incident))
}

async fn get_incident(
    State(store): State<IncidentStore>,
    Path(id): Path<u64>,
) -> Result<Json<MockIncident>, StatusCode> {
    store.get(id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn resolve_incident(
    State(store): State<IncidentStore>,
    Path(id): Path<u64>,
) -> Result<Json<MockIncident>, StatusCode> {
    store.resolve(id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn record_cctv_match(
    State(store): State<IncidentStore>,
    Path(id): Path<u64>,
    Json(body): Json<CctvMatch>,
) -> Result<Json<Value>, StatusCode> {
    tracing::info!(
        "cctv match for incident {} from {} ({:.3})",
        id,
        body.camera_id,
        body.confidence
    );

    store
        .record_match(id, body)
        .await
        .map(|incident| Json(json!({ "ok": true, "matches": incident.cctv_matches.len() })))
        .ok_or(StatusCode::NOT_FOUND)
}
