use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tinytrace_api::Shutdown;
use tinytrace_api::models::{CctvMatch, IncidentId};
use tokio::task::JoinHandle;

use crate::backend::IncidentBackend;
use crate::detector::{Detector, frame_score};
use crate::policy::{RetryPolicy, SamplingPolicy};
use crate::video::{VideoOpener, VideoSource};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub incident_id: IncidentId,
    pub startup_delay: Duration,
    /// Per-frame detector confidence threshold
    pub confidence: f32,
    pub camera_id: String,
    pub sampling: SamplingPolicy,
    pub retry: RetryPolicy,
}

impl WorkerConfig {
    pub fn new(incident_id: IncidentId) -> Self {
        Self {
            incident_id,
            startup_delay: Duration::from_secs(5),
            confidence: 0.5,
            camera_id: crate::DEFAULT_CAMERA_ID.to_string(),
            sampling: SamplingPolicy::default(),
            retry: RetryPolicy::none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    Cancelled,
    IncidentNotFound,
    IncidentClosed,
    BackendUnreachable,
    VideoUnavailable,
    NoDetection { frames_read: u64 },
    Reported { confidence: f32, attempts: u32 },
    ReportFailed { confidence: f32 },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SamplingResult {
    pub frames_read: u64,
    pub frames_sampled: u64,
    pub frame_faults: u64,
    pub max_confidence: Option<f32>,
    pub best_frame: Option<u64>,
    pub cancelled: bool,
}

/// Reads frames in order and runs the detector on the frames `policy` selects,
/// keeping the best score seen. Detector failures skip the frame.
pub fn sample_frames(
    source: &mut dyn VideoSource,
    detector: &dyn Detector,
    policy: &SamplingPolicy,
    confidence: f32,
    shutdown: &Shutdown,
) -> SamplingResult {
    let mut result = SamplingResult::default();

    loop {
        if shutdown.is_triggered() {
            result.cancelled = true;
            break;
        }

        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("video read stopped early: {}", e);
                break;
            }
        };

        let frame_index = result.frames_read;
        if policy.should_sample(frame_index) {
            result.frames_sampled += 1;

            match detector.detect(&frame, confidence) {
                Ok(detections) => {
                    if let Some(score) = frame_score(&detections) {
                        tracing::info!(
                            "child detected in frame {} with confidence {:.3}",
                            frame_index,
                            score
                        );

                        if result.max_confidence.is_none_or(|best| score > best) {
                            result.max_confidence = Some(score);
                            result.best_frame = Some(frame_index);
                        }
                    }
                }
                Err(e) => {
                    result.frame_faults += 1;
                    tracing::warn!("error processing frame: {}", e);
                }
            }
        }

        result.frames_read += 1;

        if policy.should_stop(result.frames_read, result.max_confidence.is_some()) {
            break;
        }
    }

    result
}

/// Corroborates one incident against recorded video and reports a match.
pub struct ConfirmationWorker {
    detector: Arc<dyn Detector>,
    backend: Arc<dyn IncidentBackend>,
    video: Arc<dyn VideoOpener>,
    config: WorkerConfig,
}

impl ConfirmationWorker {
    pub fn new(
        detector: Arc<dyn Detector>,
        backend: Arc<dyn IncidentBackend>,
        video: Arc<dyn VideoOpener>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            detector,
            backend,
            video,
            config,
        }
    }

    pub fn incident_id(&self) -> &IncidentId {
        &self.config.incident_id
    }

    pub fn spawn(self, shutdown: Shutdown) -> JoinHandle<WorkerOutcome> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, shutdown: Shutdown) -> WorkerOutcome {
        let id = self.config.incident_id.clone();

        tracing::info!(
            incident_id = %id,
            video = %self.video.describe(),
            delay = ?self.config.startup_delay,
            "starting cctv confirmation"
        );

        if !shutdown.sleep(self.config.startup_delay).await {
            return WorkerOutcome::Cancelled;
        }

        match self.backend.find_incident(&id).await {
            Ok(Some(incident)) if incident.is_open() => {}
            Ok(Some(_)) => {
                tracing::info!(incident_id = %id, "incident already resolved");
                return WorkerOutcome::IncidentClosed;
            }
            Ok(None) => {
                tracing::info!(incident_id = %id, "incident not found");
                return WorkerOutcome::IncidentNotFound;
            }
            Err(e) => {
                tracing::error!(incident_id = %id, "error checking incident status: {}", e);
                return WorkerOutcome::BackendUnreachable;
            }
        }

        let sampling = match self.scan_video(&shutdown).await {
            Some(sampling) => sampling,
            None => return WorkerOutcome::VideoUnavailable,
        };

        if sampling.cancelled {
            return WorkerOutcome::Cancelled;
        }

        let Some(confidence) = sampling.max_confidence else {
            tracing::info!(
                incident_id = %id,
                frames_read = sampling.frames_read,
                "no child detected in video"
            );
            return WorkerOutcome::NoDetection {
                frames_read: sampling.frames_read,
            };
        };

        self.report(confidence, &shutdown).await
    }

    async fn scan_video(&self, shutdown: &Shutdown) -> Option<SamplingResult> {
        let detector = Arc::clone(&self.detector);
        let video = Arc::clone(&self.video);
        let policy = self.config.sampling;
        let confidence = self.config.confidence;
        let shutdown = shutdown.clone();

        let task = tokio::task::spawn_blocking(move || {
            let mut source = video.open()?;
            Ok::<_, crate::error::VideoError>(sample_frames(
                source.as_mut(),
                detector.as_ref(),
                &policy,
                confidence,
                &shutdown,
            ))
        });

        match task.await {
            Ok(Ok(sampling)) => Some(sampling),
            Ok(Err(e)) => {
                tracing::error!(incident_id = %self.config.incident_id, "{}", e);
                None
            }
            Err(e) => {
                tracing::error!(incident_id = %self.config.incident_id, "video sampling aborted: {}", e);
                None
            }
        }
    }

    async fn report(&self, confidence: f32, shutdown: &Shutdown) -> WorkerOutcome {
        let id = &self.config.incident_id;
        let matched = CctvMatch {
            camera_id: self.config.camera_id.clone(),
            confidence,
            frame_ts: OffsetDateTime::now_utc(),
        };

        let mut attempt = 1;
        loop {
            match self.backend.report_match(id, &matched).await {
                Ok(()) => {
                    tracing::info!(incident_id = %id, confidence, "cctv match posted");
                    return WorkerOutcome::Reported {
                        confidence,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    tracing::error!(incident_id = %id, attempt, "error posting cctv match: {}", e);

                    attempt += 1;
                    let Some(backoff) = self.config.retry.backoff(attempt) else {
                        return WorkerOutcome::ReportFailed { confidence };
                    };
                    if !shutdown.sleep(backoff).await {
                        return WorkerOutcome::ReportFailed { confidence };
                    }
                }
            }
        }
    }
}
