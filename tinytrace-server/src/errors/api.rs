use super::IncidentError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Incident error: {0}")]
    IncidentError(#[from] IncidentError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
