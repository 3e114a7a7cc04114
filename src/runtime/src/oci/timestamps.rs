//! Image creation and update times from the OCI config blob.

use chrono::DateTime;
use modelcar_core::metadata::Timestamps;
use serde::Deserialize;

/// Fractional-second layout accepted when strict RFC 3339 parsing fails.
const LENIENT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

#[derive(Debug, Default, Deserialize)]
struct ImageConfigTimes {
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryEntry {
    #[serde(default)]
    created: Option<String>,
}

/// Timestamps derived from an image configuration.
pub struct ImageTimestamps;

impl ImageTimestamps {
    /// Read `created` and the last `history[].created` from a config blob.
    ///
    /// The update time falls back to the creation time when history is empty
    /// or its last entry has no parseable time. A blob that is not valid JSON
    /// yields no timestamps.
    pub fn from_config_blob(config_blob: &[u8]) -> Timestamps {
        let config: ImageConfigTimes = match serde_json::from_slice(config_blob) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse image config for timestamps");
                return Timestamps::default();
            }
        };

        let created = config.created.as_deref().and_then(parse_timestamp);
        let updated = config
            .history
            .last()
            .and_then(|entry| entry.created.as_deref())
            .and_then(parse_timestamp)
            .or(created);

        Timestamps { created, updated }
    }
}

/// Parse an RFC 3339 time into epoch milliseconds.
///
/// Fractional seconds are kept to the millisecond rather than truncated to
/// whole seconds: `2024-02-01T00:00:00.123456789Z` gives `1706745600123`.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, LENIENT_FORMAT))
        .map(|time| time.timestamp_millis())
        .map_err(|e| tracing::debug!(value, error = %e, "Unparseable timestamp"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_and_history() {
        let blob = br#"{
            "created": "2024-01-15T10:00:00Z",
            "history": [
                {"created": "2024-01-15T10:00:00Z"},
                {"created": "2024-02-01T00:00:00.123456789Z"}
            ]
        }"#;
        let ts = ImageTimestamps::from_config_blob(blob);
        assert_eq!(ts.created, Some(1705312800000));
        assert_eq!(ts.updated, Some(1706745600123));
    }

    #[test]
    fn test_update_falls_back_to_created() {
        let blob = br#"{"created": "2024-01-15T10:00:00Z", "history": []}"#;
        let ts = ImageTimestamps::from_config_blob(blob);
        assert_eq!(ts.created, Some(1705312800000));
        assert_eq!(ts.updated, Some(1705312800000));

        let blob = br#"{"created": "2024-01-15T10:00:00Z", "history": [{"created": "garbage"}]}"#;
        assert_eq!(
            ImageTimestamps::from_config_blob(blob).updated,
            Some(1705312800000)
        );
    }

    #[test]
    fn test_missing_fields() {
        let ts = ImageTimestamps::from_config_blob(b"{}");
        assert_eq!(ts, Timestamps::default());
    }

    #[test]
    fn test_invalid_json() {
        let ts = ImageTimestamps::from_config_blob(b"not json");
        assert_eq!(ts.created, None);
        assert_eq!(ts.updated, None);
    }

    #[test]
    fn test_parse_timestamp_offsets() {
        assert_eq!(parse_timestamp("2024-01-15T11:00:00+01:00"), Some(1705312800000));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
