use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tinytrace_analyser::ProximityAnalyzer;
use tinytrace_cctv::DispatchHandle;
use tower::ServiceExt;

use tinytrace_server::app::{AppState, create_app};
use tinytrace_server::services::{
    Advertisement, AlertLog, MonitorPublisher, SignalStream, proximity_observer,
};

pub const TARGET: &str = "Child-01";

pub struct MockApp {
    pub router: Router,
    pub publisher: MonitorPublisher,
    pub alert_log: AlertLog,
    pub stream: SignalStream,
}

impl MockApp {
    pub fn new() -> Self {
        Self::with_dispatch(None)
    }

    pub fn with_dispatch(dispatch: Option<DispatchHandle>) -> Self {
        let publisher = MonitorPublisher::new(3, -80);
        let alert_log = AlertLog::new();

        let mut stream = SignalStream::new(TARGET);
        stream.subscribe(proximity_observer(
            ProximityAnalyzer::new(-80, 3).unwrap(),
            publisher.clone(),
        ));

        let router = create_app(AppState {
            reader: publisher.reader(),
            alert_log: alert_log.clone(),
            dispatch,
        });

        Self {
            router,
            publisher,
            alert_log,
            stream,
        }
    }

    /// Delivers one advertisement from the tracked tag.
    pub fn advertise(&mut self, rssi: i16) {
        self.stream
            .ingest(&Advertisement::new("5C:F3:70:00:00:01", Some(TARGET), Some(rssi)))
            .unwrap();
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).method(Method::POST);
        let request = match body {
            Some(body) => request
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        };

        self.send(request.unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };

        (status, value)
    }
}
