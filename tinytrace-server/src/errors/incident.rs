use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum IncidentError {
    #[error("Invalid incident id")]
    InvalidIncidentId,

    #[error("CCTV confirmation is not configured")]
    ConfirmationUnavailable,

    #[error("CCTV confirmation has stopped")]
    ConfirmationStopped,
}

impl IncidentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IncidentError::InvalidIncidentId => StatusCode::BAD_REQUEST,
            IncidentError::ConfirmationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            IncidentError::ConfirmationStopped => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
