use std::sync::Arc;

use time::OffsetDateTime;
use tinytrace_analyser::{Analysis, Classification, ProximityAnalyzer};
use tinytrace_api::models::{MonitorSnapshot, MonitorStatus, Rssi, SignalSample};
use tokio::sync::watch;

/// Sole writer of the monitor snapshot. Every update replaces the whole record
/// under the channel lock, so readers never see a partial update.
#[derive(Clone)]
pub struct MonitorPublisher {
    sender: Arc<watch::Sender<MonitorSnapshot>>,
}

impl MonitorPublisher {
    pub fn new(window_size: usize, threshold: Rssi) -> Self {
        let (sender, _) = watch::channel(MonitorSnapshot::new(window_size, threshold));

        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn reader(&self) -> MonitorReader {
        MonitorReader {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn publish_analysis(&self, analysis: &Analysis, observed_at: OffsetDateTime) {
        self.sender.send_modify(|snapshot| {
            snapshot.enabled = true;
            snapshot.status = match analysis.classification {
                Classification::Safe => MonitorStatus::Safe,
                Classification::Warning => MonitorStatus::Warning,
            };
            snapshot.latest_rssi = Some(analysis.latest);
            snapshot.average_rssi = Some(analysis.average);
            snapshot.last_update = Some(observed_at);
            snapshot.error = None;
        });
    }

    /// Marks the signal source as running again after a fault.
    pub fn publish_enabled(&self) {
        self.sender.send_if_modified(|snapshot| {
            if snapshot.enabled && snapshot.error.is_none() {
                return false;
            }
            snapshot.enabled = true;
            snapshot.error = None;
            true
        });
    }

    /// Readings taken before the fault are dropped with the status, so a
    /// recovered monitor reports nothing until fresh samples arrive.
    pub fn publish_fault(&self, cause: impl Into<String>) {
        let cause = cause.into();
        self.sender.send_modify(|snapshot| {
            snapshot.enabled = false;
            snapshot.status = MonitorStatus::Unknown;
            snapshot.latest_rssi = None;
            snapshot.average_rssi = None;
            snapshot.last_update = None;
            snapshot.error = Some(cause);
        });
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.sender.borrow().clone()
    }
}

#[derive(Clone)]
pub struct MonitorReader {
    receiver: watch::Receiver<MonitorSnapshot>,
}

impl MonitorReader {
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.receiver.borrow().clone()
    }

    /// Waits for the next publish. Errors once the publisher is gone.
    pub async fn changed(&mut self) -> Result<MonitorSnapshot, watch::error::RecvError> {
        self.receiver.changed().await?;
        Ok(self.receiver.borrow_and_update().clone())
    }
}

/// Observer that feeds every sample through `analyzer` and publishes the result.
pub fn proximity_observer(
    mut analyzer: ProximityAnalyzer,
    publisher: MonitorPublisher,
) -> impl FnMut(&SignalSample) + Send + 'static {
    move |sample| {
        let analysis = analyzer.analyze(sample.rssi);

        if analysis.classification.is_warning() {
            tracing::warn!(
                source = %sample.source_id,
                rssi = analysis.latest,
                average = analysis.average,
                "signal below threshold, child may be out of range"
            );
        } else {
            tracing::debug!(
                rssi = analysis.latest,
                average = analysis.average,
                "within safe range"
            );
        }

        publisher.publish_analysis(&analysis, sample.observed_at);
    }
}
