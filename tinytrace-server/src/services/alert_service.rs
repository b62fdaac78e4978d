use std::sync::Arc;

use tinytrace_api::models::{AlertRecord, AlertRequest, MonitorSnapshot};
use tokio::sync::RwLock;

/// Operator-raised alerts, oldest first. Logging an alert never touches the
/// monitor state.
#[derive(Clone, Default)]
pub struct AlertLog {
    records: Arc<RwLock<Vec<AlertRecord>>>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, request: AlertRequest, snapshot: &MonitorSnapshot) -> AlertRecord {
        let record = AlertRecord::from_request(request, snapshot);
        tracing::info!(
            source = %record.source,
            status = %record.status,
            rssi = ?record.rssi,
            "alert logged: {}",
            record.note
        );

        self.records.write().await.push(record.clone());
        record
    }

    pub async fn list(&self) -> Vec<AlertRecord> {
        self.records.read().await.clone()
    }
}
