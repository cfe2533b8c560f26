// src/utils/json.rs

//! JSON read/write settings.
//!
//! Passed explicitly to the catalog client and local storage. Timestamps are
//! `DateTime<Utc>` throughout, so offset-less local times fail to parse, and
//! models mark optional fields `skip_serializing_if` so absent values are
//! omitted on write.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSettings {
    /// Indent written documents
    pub pretty: bool,
}

impl JsonSettings {
    /// Settings for documents meant to be read by people.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Parse a document, reporting failures as `AppError::Parse`.
    pub fn parse<T: DeserializeOwned>(&self, context: &str, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| AppError::parse(context, e))
    }

    /// Serialize a value.
    pub fn to_vec<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stamp {
        at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    #[test]
    fn test_parse_error_carries_context() {
        let err = JsonSettings::default()
            .parse::<Stamp>("cursor file", b"{not json")
            .unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("cursor file"));
    }

    #[test]
    fn test_offsets_normalize_to_utc() {
        let stamp: Stamp = JsonSettings::default()
            .parse("stamp", br#"{"at":"2020-01-01T02:00:00+02:00"}"#)
            .unwrap();
        assert_eq!(stamp.at.to_rfc3339(), "2020-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_local_time_rejected() {
        let result = JsonSettings::default().parse::<Stamp>("stamp", br#"{"at":"2020-01-01T02:00:00"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_absent_fields_omitted() {
        let bytes = JsonSettings::default()
            .to_vec(&Stamp {
                at: DateTime::<Utc>::MIN_UTC,
                note: None,
            })
            .unwrap();
        assert!(!String::from_utf8(bytes).unwrap().contains("note"));
    }
}
