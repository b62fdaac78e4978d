use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tinytrace_api::models::{CctvMatch, IncidentStatus};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockIncident {
    pub id: u64,
    pub status: IncidentStatus,
    pub note: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub cctv_matches: Vec<CctvMatch>,
}

/// In-memory incident records, newest first.
#[derive(Clone, Default)]
pub struct IncidentStore {
    incidents: Arc<RwLock<Vec<MockIncident>>>,
}

impl IncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, note: impl Into<String>) -> MockIncident {
        let mut incidents = self.incidents.write().await;
        let id = incidents.iter().map(|incident| incident.id).max().unwrap_or(0) + 1;

        let incident = MockIncident {
            id,
            status: IncidentStatus::Open,
            note: note.into(),
            created_at: OffsetDateTime::now_utc(),
            cctv_matches: Vec::new(),
        };
        incidents.insert(0, incident.clone());

        incident
    }

    pub async fn list(&self) -> Vec<MockIncident> {
        self.incidents.read().await.clone()
    }

    pub async fn get(&self, id: u64) -> Option<MockIncident> {
        self.incidents
            .read()
            .await
            .iter()
            .find(|incident| incident.id == id)
            .cloned()
    }

    pub async fn resolve(&self, id: u64) -> Option<MockIncident> {
        let mut incidents = self.incidents.write().await;
        let incident = incidents.iter_mut().find(|incident| incident.id == id)?;
        incident.status = IncidentStatus::Resolved;

        Some(incident.clone())
    }

    pub async fn record_match(&self, id: u64, matched: CctvMatch) -> Option<MockIncident> {
        let mut incidents = self.incidents.write().await;
        let incident = incidents.iter_mut().find(|incident| incident.id == id)?;
        incident.cctv_matches.push(matched);

        Some(incident.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_newest_incident_first() {
        let store = IncidentStore::new();
        store.open("first").await;
        store.open("second").await;

        let incidents = store.list().await;
        assert_eq!(incidents[0].id, 2);
        assert_eq!(incidents[1].id, 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_incident() {
        let store = IncidentStore::new();

        assert!(store.resolve(4).await.is_none());
    }
}
