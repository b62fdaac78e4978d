pub mod backend;
pub mod detector;
pub mod dispatch;
pub mod error;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod policy;
pub mod video;
pub mod worker;

pub use backend::{HttpBackend, IncidentBackend, latest_open_incident};
pub use detector::{BoundingBox, Detection, Detector, ReplayDetector, frame_score, load_detector};
pub use dispatch::{DispatchHandle, WorkerDispatcher, WorkerTemplate};
pub use error::{BackendError, DetectorError, DispatchError, VideoError};
pub use policy::{RetryPolicy, SamplingPolicy};
pub use video::{Frame, FrameDirectory, VideoOpener, VideoSource};
pub use worker::{ConfirmationWorker, SamplingResult, WorkerConfig, WorkerOutcome, sample_frames};

/// Camera id attached to match reports when none is configured.
pub const DEFAULT_CAMERA_ID: &str = "CAM_GATE_3";
