use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tinytrace_api::models::{CctvMatch, Incident, IncidentId};

use crate::error::BackendError;

pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// The backend that owns incident records.
#[async_trait]
pub trait IncidentBackend: Send + Sync {
    /// All incidents, most recent first.
    async fn incidents(&self) -> Result<Vec<Incident>, BackendError>;

    async fn report_match(&self, id: &IncidentId, matched: &CctvMatch) -> Result<(), BackendError>;

    async fn find_incident(&self, id: &IncidentId) -> Result<Option<Incident>, BackendError> {
        Ok(self
            .incidents()
            .await?
            .into_iter()
            .find(|incident| &incident.id == id))
    }
}

/// Most recent incident that is still open; resolved ones are skipped.
pub async fn latest_open_incident(
    backend: &dyn IncidentBackend,
) -> Result<Option<Incident>, BackendError> {
    Ok(backend.incidents().await?.into_iter().find(Incident::is_open))
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    status_timeout: Duration,
    report_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, BackendError> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|e| BackendError::InvalidUrl(format!("{raw}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(raw.to_string()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(STATUS_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            status_timeout: STATUS_TIMEOUT,
            report_timeout: REPORT_TIMEOUT,
        })
    }

    pub fn with_timeouts(mut self, status_timeout: Duration, report_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self.report_timeout = report_timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status { status, body })
    }
}

#[async_trait]
impl IncidentBackend for HttpBackend {
    async fn incidents(&self) -> Result<Vec<Incident>, BackendError> {
        let response = self
            .client
            .get(self.endpoint(&["incidents"]))
            .timeout(self.status_timeout)
            .send()
            .await?;

        Ok(Self::ensure_success(response).await?.json().await?)
    }

    async fn report_match(&self, id: &IncidentId, matched: &CctvMatch) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.endpoint(&["incident", id.as_str(), "cctv_match"]))
            .timeout(self.report_timeout)
            .json(matched)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        tracing::debug!(
            incident_id = %id,
            "cctv match accepted: {}",
            response.text().await.unwrap_or_default()
        );

        Ok(())
    }
}
