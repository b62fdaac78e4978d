use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Rssi;

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    /// No classification available, or monitoring is faulted
    #[default]
    Unknown,
    /// Averaged signal is at or above the threshold
    Safe,
    /// Averaged signal dropped below the threshold
    Warning,
}

impl core::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            MonitorStatus::Unknown => write!(f, "unknown"),
            MonitorStatus::Safe => write!(f, "safe"),
            MonitorStatus::Warning => write!(f, "warning"),
        }
    }
}

/// Published state of the proximity monitor, replaced as a whole on every update.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    /// Whether the signal source is currently running
    pub enabled: bool,
    /// Latest classification
    pub status: MonitorStatus,
    /// Most recent sample in dBm
    pub latest_rssi: Option<Rssi>,
    /// Mean of the samples currently in the window
    pub average_rssi: Option<f64>,
    /// Capacity of the smoothing window
    pub window_size: usize,
    /// Warning threshold in dBm
    pub threshold: Rssi,
    /// Time of the last classification
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
    /// Human readable cause when monitoring is faulted
    pub error: Option<String>,
}

impl MonitorSnapshot {
    pub fn new(window_size: usize, threshold: Rssi) -> Self {
        Self {
            enabled: false,
            status: MonitorStatus::Unknown,
            latest_rssi: None,
            average_rssi: None,
            window_size,
            threshold,
            last_update: None,
            error: None,
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.error.is_some()
    }
}
