/// Failures of the advertisement source. None of them end the scan loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),

    #[error("failed to start scanning: {0}")]
    Start(String),

    #[error("failed to stop scanning: {0}")]
    Stop(String),
}
