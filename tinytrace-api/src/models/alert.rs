use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{MonitorSnapshot, MonitorStatus, Rssi};

pub const DEFAULT_ALERT_SOURCE: &str = "web";

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRequest {
    /// Where the alert was raised, e.g. "dashboard"
    pub source: Option<String>,
    /// Free-form operator note
    pub note: Option<String>,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Time the alert was logged
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub source: String,
    pub note: String,
    /// Latest signal strength at logging time
    pub rssi: Option<Rssi>,
    /// Averaged signal strength at logging time
    pub avg_rssi: Option<f64>,
    /// Monitor status at logging time
    pub status: MonitorStatus,
}

impl AlertRecord {
    pub fn from_request(request: AlertRequest, snapshot: &MonitorSnapshot) -> Self {
        Self {
            ts: OffsetDateTime::now_utc(),
            source: request
                .source
                .unwrap_or_else(|| DEFAULT_ALERT_SOURCE.to_string()),
            note: request.note.unwrap_or_default(),
            rssi: snapshot.latest_rssi,
            avg_rssi: snapshot.average_rssi,
            status: snapshot.status,
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub ok: bool,
    pub logged: AlertRecord,
}
