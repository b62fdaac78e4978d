use std::path::PathBuf;

use tinytrace_api::models::IncidentId;

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Failed to load detector model {path}: {reason}")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Frame {index} could not be processed: {reason}")]
    Frame { index: u64, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("Video source {0} not found")]
    NotFound(PathBuf),

    #[error("Could not open video {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read frame {index}: {source}")]
    Read {
        index: u64,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid backend url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Worker dispatcher has stopped; incident {0} was not queued")]
    Closed(IncidentId),
}
