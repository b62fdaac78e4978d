use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Identifier of an incident owned by the backend.
///
/// Backends emit either JSON strings or integers; both are kept in their
/// textual form so that ids typed on a command line compare equal.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IncidentId(String);

impl IncidentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for IncidentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => IncidentId(text),
            RawId::Signed(number) => IncidentId(number.to_string()),
            RawId::Unsigned(number) => IncidentId(number.to_string()),
        })
    }
}

impl From<&str> for IncidentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IncidentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Resolved,
    /// Any lifecycle state this crate does not act on
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub status: IncidentStatus,
}

impl Incident {
    pub fn is_open(&self) -> bool {
        self.status == IncidentStatus::Open
    }
}

/// Body of `POST /incident/{id}/cctv_match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CctvMatch {
    pub camera_id: String,
    /// Highest detector confidence observed, in `[0, 1]`
    pub confidence: f32,
    #[serde(with = "time::serde::rfc3339")]
    pub frame_ts: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_id_accepts_numbers_and_strings() {
        let incidents: Vec<Incident> = serde_json::from_str(
            r#"[{"id": 42, "status": "open"}, {"id": "INC-7", "status": "resolved"}]"#,
        )
        .unwrap();

        assert_eq!(incidents[0].id, IncidentId::from("42"));
        assert!(incidents[0].is_open());
        assert_eq!(incidents[1].id.as_str(), "INC-7");
        assert!(!incidents[1].is_open());
    }

    #[test]
    fn test_unrecognised_status_is_not_open() {
        let incident: Incident =
            serde_json::from_str(r#"{"id": "9", "status": "escalated", "note": "x"}"#).unwrap();

        assert_eq!(incident.status, IncidentStatus::Other);
        assert!(!incident.is_open());
    }
}
