use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use tinytrace_analyser::ProximityAnalyzer;
use tinytrace_api::Shutdown;
use tinytrace_api::models::IncidentId;
use tinytrace_cctv::{
    DispatchHandle, FrameDirectory, HttpBackend, RetryPolicy, WorkerConfig, WorkerDispatcher,
    WorkerOutcome, WorkerTemplate, load_detector,
};
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::configs::{Cctv, Settings};
use crate::handles::*;
use crate::services::scanner::build_scanner;
use crate::services::{
    AlertLog, MonitorPublisher, MonitorReader, ScanCycleController, ScanSummary, SignalStream,
    proximity_observer,
};

/// Queue length for pending confirmation requests.
const DISPATCH_CAPACITY: usize = 16;

#[derive(OpenApi)]
#[openapi(
    paths(get_monitor, create_alert, get_alerts, confirm_incident),
    tags(
        (name = "monitor", description = "Published proximity state"),
        (name = "alert", description = "Operator alerts"),
        (name = "incident", description = "CCTV corroboration of incidents")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub reader: MonitorReader,
    pub alert_log: AlertLog,
    pub dispatch: Option<DispatchHandle>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(monitor_router(MonitorState {
            reader: state.reader.clone(),
        }))
        .merge(alert_router(AlertState {
            reader: state.reader,
            alert_log: state.alert_log,
        }))
        .merge(incident_router(IncidentState {
            dispatch: state.dispatch,
        }))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Builds the analyzer, signal stream and scanner and spawns the scan loop.
/// Setup failures are published as a monitor fault instead of stopping the
/// process.
pub async fn start_monitor(
    settings: &Settings,
    publisher: MonitorPublisher,
    shutdown: Shutdown,
) -> Option<JoinHandle<ScanSummary>> {
    let monitor = &settings.monitor;

    let analyzer = match ProximityAnalyzer::new(monitor.threshold, monitor.window_size) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            tracing::error!("proximity analyzer not started: {}", e);
            publisher.publish_fault(e.to_string());
            return None;
        }
    };

    let scanner = match build_scanner(&settings.radio, &monitor.target_name).await {
        Ok(scanner) => scanner,
        Err(e) => {
            tracing::error!("signal source unavailable: {}", e);
            publisher.publish_fault(e.to_string());
            return None;
        }
    };

    let mut stream = SignalStream::new(&monitor.target_name);
    stream.subscribe(proximity_observer(analyzer, publisher.clone()));

    let controller = ScanCycleController::new(
        scanner,
        stream,
        publisher,
        Duration::from_secs(monitor.scan_period_secs),
        Duration::from_secs(monitor.retry_delay_secs),
    );

    Some(tokio::spawn(controller.run(shutdown)))
}

pub fn worker_template(cctv: &Cctv) -> anyhow::Result<WorkerTemplate> {
    let detector = load_detector(&cctv.model_path)?;
    let video = match &cctv.video_path {
        Some(path) => FrameDirectory::new(path),
        None => FrameDirectory::bundled(),
    };
    if !video.exists() {
        tracing::warn!(
            "video {} not found, confirmations will end without a report",
            video.path().display()
        );
    }
    let backend = HttpBackend::new(&cctv.backend_url)?;

    let config = WorkerConfig {
        startup_delay: Duration::from_secs(cctv.startup_delay_secs),
        confidence: cctv.confidence,
        camera_id: cctv.camera_id.clone(),
        sampling: cctv.sampling,
        retry: RetryPolicy::with_attempts(cctv.report_attempts),
        ..WorkerConfig::new(IncidentId::from(""))
    };

    Ok(WorkerTemplate {
        detector,
        backend: Arc::new(backend),
        video: Arc::new(video),
        config,
    })
}

/// Spawns the confirmation dispatcher when CCTV is configured and its detector
/// loads.
pub fn start_dispatcher(
    settings: &Settings,
    shutdown: Shutdown,
) -> Option<(DispatchHandle, JoinHandle<Vec<(IncidentId, WorkerOutcome)>>)> {
    let cctv = settings.cctv.as_ref()?;

    let template = match worker_template(cctv) {
        Ok(template) => template,
        Err(e) => {
            tracing::error!("cctv confirmation disabled: {:#}", e);
            return None;
        }
    };

    let (dispatcher, handle) = WorkerDispatcher::new(template, DISPATCH_CAPACITY);
    tracing::info!(backend = %cctv.backend_url, "cctv confirmation enabled");

    Some((handle, tokio::spawn(dispatcher.run(shutdown))))
}
