use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Rssi;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSample {
    /// Advertised name of the beacon that produced the sample
    pub source_id: String,
    /// Signal strength in dBm
    pub rssi: Rssi,
    /// Time the advertisement was observed
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
}

impl SignalSample {
    pub fn new(source_id: impl Into<String>, rssi: Rssi) -> Self {
        Self {
            source_id: source_id.into(),
            rssi,
            observed_at: OffsetDateTime::now_utc(),
        }
    }
}
