//! # Recording Artifact
//!
//! A completed telemetry recording and its JSON export form:
//!
//! ```text
//! {"startTime": <epoch-ms>,
//!  "data": [{"timestamp": <relative-ms>,
//!            "sections": [{"id", "name", "values": [[key, record], ...]}]}]}
//! ```

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::telemetry::SectionSnapshot;

/// One captured frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedSample {
    /// Milliseconds since the recording started
    pub timestamp: i64,
    pub sections: Vec<SectionSnapshot>,
}

/// A telemetry recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Epoch milliseconds
    pub start_time: i64,
    pub data: Vec<RecordedSample>,
}

impl Recording {
    pub fn new(start_time: i64) -> Self {
        Self {
            start_time,
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Relative timestamp of the last sample
    pub fn duration_ms(&self) -> i64 {
        self.data.last().map(|s| s.timestamp).unwrap_or(0)
    }

    /// Serialize to the pretty-printed export form. Does not modify `self`.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode an exported recording
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a valid recording export
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Download file name, e.g. `telemetry-2024-03-09T14-05-00.000Z.json`
    pub fn file_name(&self) -> String {
        let started = Utc
            .timestamp_millis_opt(self.start_time)
            .single()
            .map(|t| t.format("%Y-%m-%dT%H-%M-%S%.3fZ").to_string())
            .unwrap_or_else(|| self.start_time.to_string());
        format!("telemetry-{}.json", started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{SectionId, TelemetrySection, TelemetryValue};
    use proptest::prelude::*;

    fn sample(ts: i64, v: f64) -> RecordedSample {
        let mut section = TelemetrySection::new(SectionId::General);
        section.upsert(TelemetryValue::new("voltage", v, ts));
        RecordedSample {
            timestamp: ts,
            sections: vec![section.snapshot()],
        }
    }

    #[test]
    fn test_export_shape() {
        let mut recording = Recording::new(1_700_000_000_000);
        recording.data.push(sample(0, 12.5));

        let json: serde_json::Value = serde_json::from_str(&recording.to_json().unwrap()).unwrap();
        assert_eq!(json["startTime"], 1_700_000_000_000_i64);
        assert_eq!(json["data"][0]["timestamp"], 0);
        assert_eq!(json["data"][0]["sections"][0]["id"], "general");
        assert_eq!(json["data"][0]["sections"][0]["name"], "General");
        assert_eq!(json["data"][0]["sections"][0]["values"][0][0], "voltage");
        assert_eq!(json["data"][0]["sections"][0]["values"][0][1]["value"], 12.5);
    }

    #[test]
    fn test_export_does_not_mutate() {
        let mut recording = Recording::new(0);
        recording.data.push(sample(0, 1.0));
        let before = recording.clone();
        let _ = recording.to_json().unwrap();
        assert_eq!(recording, before);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(Recording::from_json("{\"startTime\": \"soon\"}").is_err());
    }

    #[test]
    fn test_file_name_uses_start_time() {
        let recording = Recording::new(0);
        assert_eq!(recording.file_name(), "telemetry-1970-01-01T00-00-00.000Z.json");
    }

    #[test]
    fn test_duration() {
        let mut recording = Recording::new(0);
        assert_eq!(recording.duration_ms(), 0);
        recording.data.push(sample(0, 1.0));
        recording.data.push(sample(300, 1.0));
        assert_eq!(recording.duration_ms(), 300);
    }

    proptest! {
        #[test]
        fn prop_export_round_trip_keeps_count_and_order(
            start in 0i64..2_000_000_000_000,
            gaps in proptest::collection::vec(0i64..5_000, 1..30)
        ) {
            let mut recording = Recording::new(start);
            let mut ts = 0;
            for (i, gap) in gaps.iter().enumerate() {
                ts += gap;
                recording.data.push(sample(ts, i as f64));
            }

            let decoded = Recording::from_json(&recording.to_json().unwrap()).unwrap();
            prop_assert_eq!(decoded.len(), recording.len());
            prop_assert!(decoded.data.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            prop_assert_eq!(decoded, recording);
        }
    }
}
