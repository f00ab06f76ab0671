//! Registry response types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Ownership record as reported by a land registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    #[serde(default)]
    pub current_owner_name: Option<String>,
    #[serde(default)]
    pub current_owner_id: Option<String>,
    /// RFC 3339 timestamp or plain `YYYY-MM-DD` date
    #[serde(default, deserialize_with = "deserialize_registry_date")]
    pub last_modified_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RegistryRecord {
    /// Record with the given owner and no modification date
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            current_owner_id: Some(owner_id.into()),
            ..Default::default()
        }
    }

    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified_date = Some(at);
        self
    }

    /// Whether either owner field names the given legal entity
    pub fn is_owned_by(&self, legal_entity_id: &str) -> bool {
        let expected = legal_entity_id.trim();
        [&self.current_owner_id, &self.current_owner_name]
            .into_iter()
            .flatten()
            .any(|owner| owner.trim().eq_ignore_ascii_case(expected))
    }

    /// Owner as reported, for flag messages
    pub fn reported_owner(&self) -> &str {
        self.current_owner_id
            .as_deref()
            .or(self.current_owner_name.as_deref())
            .unwrap_or("<none>")
    }
}

fn deserialize_registry_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognised date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_and_plain_date() {
        let json = r#"{ "current_owner_id": "SPV-1", "last_modified_date": "2024-03-01T10:00:00Z" }"#;
        let record: RegistryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.last_modified_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );

        let json = r#"{ "current_owner_id": "SPV-1", "last_modified_date": "2024-03-01" }"#;
        let record: RegistryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.last_modified_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_missing_and_null_fields() {
        let record: RegistryRecord =
            serde_json::from_str(r#"{ "last_modified_date": null }"#).unwrap();
        assert_eq!(record, RegistryRecord::default());
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let result: Result<RegistryRecord, _> =
            serde_json::from_str(r#"{ "last_modified_date": "last tuesday" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_owner_match_is_case_insensitive_on_either_field() {
        let by_id = RegistryRecord::owned_by(" spv-ltd-42 ");
        assert!(by_id.is_owned_by("SPV-LTD-42"));

        let by_name = RegistryRecord {
            current_owner_name: Some("SPV-LTD-42".to_string()),
            ..Default::default()
        };
        assert!(by_name.is_owned_by("SPV-LTD-42"));
        assert!(!RegistryRecord::default().is_owned_by("SPV-LTD-42"));
        assert_eq!(RegistryRecord::default().reported_owner(), "<none>");
    }
}
