use std::collections::HashSet;
use std::sync::Arc;

use tinytrace_api::Shutdown;
use tinytrace_api::models::IncidentId;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::backend::IncidentBackend;
use crate::detector::Detector;
use crate::error::DispatchError;
use crate::video::VideoOpener;
use crate::worker::{ConfirmationWorker, WorkerConfig, WorkerOutcome};

/// Everything a worker needs except the incident id.
#[derive(Clone)]
pub struct WorkerTemplate {
    pub detector: Arc<dyn Detector>,
    pub backend: Arc<dyn IncidentBackend>,
    pub video: Arc<dyn VideoOpener>,
    pub config: WorkerConfig,
}

impl WorkerTemplate {
    pub fn build(&self, incident_id: IncidentId) -> ConfirmationWorker {
        let config = WorkerConfig {
            incident_id,
            ..self.config.clone()
        };

        ConfirmationWorker::new(
            Arc::clone(&self.detector),
            Arc::clone(&self.backend),
            Arc::clone(&self.video),
            config,
        )
    }
}

#[derive(Debug, Clone)]
pub struct DispatchHandle {
    sender: mpsc::Sender<IncidentId>,
}

impl DispatchHandle {
    pub async fn confirm(&self, incident_id: IncidentId) -> Result<(), DispatchError> {
        self.sender
            .send(incident_id)
            .await
            .map_err(|e| DispatchError::Closed(e.0))
    }
}

/// Spawns one confirmation worker per requested incident.
pub struct WorkerDispatcher {
    template: WorkerTemplate,
    receiver: mpsc::Receiver<IncidentId>,
    in_flight: HashSet<IncidentId>,
    workers: JoinSet<(IncidentId, WorkerOutcome)>,
}

impl WorkerDispatcher {
    pub fn new(template: WorkerTemplate, capacity: usize) -> (Self, DispatchHandle) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        (
            Self {
                template,
                receiver,
                in_flight: HashSet::new(),
                workers: JoinSet::new(),
            },
            DispatchHandle { sender },
        )
    }

    /// Runs until every handle is dropped or `shutdown` fires, then waits for
    /// the workers still running.
    pub async fn run(mut self, shutdown: Shutdown) -> Vec<(IncidentId, WorkerOutcome)> {
        let mut finished = Vec::new();

        loop {
            tokio::select! {
                request = self.receiver.recv() => {
                    let Some(incident_id) = request else { break };
                    self.dispatch(incident_id, &shutdown);
                }
                Some(joined) = self.workers.join_next() => {
                    if let Some(done) = self.complete(joined) {
                        finished.push(done);
                    }
                }
                _ = shutdown.triggered() => break,
            }
        }

        while let Some(joined) = self.workers.join_next().await {
            if let Some(done) = self.complete(joined) {
                finished.push(done);
            }
        }

        finished
    }

    fn dispatch(&mut self, incident_id: IncidentId, shutdown: &Shutdown) {
        if !self.in_flight.insert(incident_id.clone()) {
            tracing::debug!(incident_id = %incident_id, "confirmation already running");
            return;
        }

        let worker = self.template.build(incident_id.clone());
        let shutdown = shutdown.clone();
        self.workers.spawn(async move {
            let outcome = worker.run(shutdown).await;
            (incident_id, outcome)
        });
    }

    fn complete(
        &mut self,
        joined: Result<(IncidentId, WorkerOutcome), tokio::task::JoinError>,
    ) -> Option<(IncidentId, WorkerOutcome)> {
        match joined {
            Ok((incident_id, outcome)) => {
                self.in_flight.remove(&incident_id);
                tracing::info!(incident_id = %incident_id, ?outcome, "confirmation finished");
                Some((incident_id, outcome))
            }
            Err(e) => {
                tracing::error!("confirmation worker panicked: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tinytrace_api::models::{CctvMatch, Incident, IncidentStatus};
    use tinytrace_api::shutdown_channel;

    use super::*;
    use crate::detector::{DetectionSheet, ReplayDetector};
    use crate::error::BackendError;
    use crate::video::FrameDirectory;

    struct ClosedIncidents;

    #[async_trait]
    impl IncidentBackend for ClosedIncidents {
        async fn incidents(&self) -> Result<Vec<Incident>, BackendError> {
            Ok(vec![
                Incident {
                    id: IncidentId::from("1"),
                    status: IncidentStatus::Resolved,
                },
                Incident {
                    id: IncidentId::from("2"),
                    status: IncidentStatus::Resolved,
                },
            ])
        }

        async fn report_match(&self, _: &IncidentId, _: &CctvMatch) -> Result<(), BackendError> {
            Ok(())
        }
    }

    fn template(delay: Duration) -> WorkerTemplate {
        let mut config = WorkerConfig::new(IncidentId::default());
        config.startup_delay = delay;

        WorkerTemplate {
            detector: Arc::new(ReplayDetector::from_sheet(DetectionSheet::default())),
            backend: Arc::new(ClosedIncidents),
            video: Arc::new(FrameDirectory::bundled()),
            config,
        }
    }

    #[tokio::test]
    async fn test_one_worker_per_incident() {
        let (dispatcher, handle) = WorkerDispatcher::new(template(Duration::ZERO), 8);
        let running = tokio::spawn(dispatcher.run(Shutdown::never()));

        handle.confirm(IncidentId::from("1")).await.unwrap();
        handle.confirm(IncidentId::from("2")).await.unwrap();
        drop(handle);

        let mut finished = running.await.unwrap();
        finished.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            finished,
            vec![
                (IncidentId::from("1"), WorkerOutcome::IncidentClosed),
                (IncidentId::from("2"), WorkerOutcome::IncidentClosed),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_request_while_running_is_ignored() {
        let (dispatcher, handle) = WorkerDispatcher::new(template(Duration::from_secs(5)), 8);
        let running = tokio::spawn(dispatcher.run(Shutdown::never()));

        handle.confirm(IncidentId::from("1")).await.unwrap();
        handle.confirm(IncidentId::from("1")).await.unwrap();
        drop(handle);

        assert_eq!(running.await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_workers() {
        let (trigger, shutdown) = shutdown_channel();
        let (dispatcher, handle) = WorkerDispatcher::new(template(Duration::from_secs(60)), 8);
        let running = tokio::spawn(dispatcher.run(shutdown));

        handle.confirm(IncidentId::from("1")).await.unwrap();
        tokio::task::yield_now().await;
        trigger.trigger();

        let finished = running.await.unwrap();
        assert_eq!(
            finished,
            vec![(IncidentId::from("1"), WorkerOutcome::Cancelled)]
        );
        assert!(handle.confirm(IncidentId::from("2")).await.is_err());
    }
}
