//! # Inbound Message Decoder
//!
//! Classifies JSON envelopes received from the robot.
//!
//! Two envelope types carry dashboard state:
//!
//! ```text
//! {"type":"SUBSYSTEM_UPDATE","subsystem":"drivetrain","data":{...},"timestamp":1700000000000}
//! {"type":"TELEMETRY_UPDATE","section":"intake","values":[{"key":"slide","value":4.2,"unit":"cm"}],"timestamp":1700000000000}
//! ```
//!
//! Any other `type` is passed through untouched. An envelope without a
//! `type` or without its target (`subsystem` / `section`) is malformed.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::subsystem::SubsystemId;
use crate::telemetry::{SectionId, TelemetryData, TelemetryValue};

/// `type` of a subsystem snapshot update
pub const SUBSYSTEM_UPDATE: &str = "SUBSYSTEM_UPDATE";

/// `type` of a telemetry section update
pub const TELEMETRY_UPDATE: &str = "TELEMETRY_UPDATE";

/// `type` of the robot's reply to a status poll
pub const RECEIVE_ROBOT_STATUS: &str = "RECEIVE_ROBOT_STATUS";

/// Why an envelope was dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedMessage {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("envelope is not a JSON object")]
    NotAnObject,

    #[error("missing message type")]
    MissingType,

    #[error("{0} is missing its target")]
    MissingTarget(&'static str),

    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Raw `SUBSYSTEM_UPDATE` envelope. `data` is decoded later by the router
/// so that numeric leaves can also be matched against graph keys.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsystemEnvelope {
    pub subsystem: SubsystemId,
    pub data: Value,
    pub timestamp: Option<i64>,
}

/// A value as sent on the wire, before it is stamped
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireTelemetryValue {
    pub key: String,
    pub value: TelemetryData,
    #[serde(default)]
    pub unit: Option<String>,
}

impl WireTelemetryValue {
    /// Attach the envelope timestamp
    pub fn stamp(self, timestamp: i64) -> TelemetryValue {
        TelemetryValue {
            key: self.key,
            value: self.value,
            unit: self.unit,
            timestamp,
        }
    }
}

/// Decoded `TELEMETRY_UPDATE` envelope
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryEnvelope {
    pub section: SectionId,
    pub values: Vec<WireTelemetryValue>,
    pub timestamp: Option<i64>,
}

/// A classified inbound envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Subsystem(SubsystemEnvelope),
    Telemetry(TelemetryEnvelope),
    /// Any other message type, forwarded unchanged
    PassThrough { kind: String, message: Value },
}

/// Decode one line of JSON text.
///
/// # Errors
///
/// Returns the reason the envelope must be dropped
///
/// # Examples
///
/// ```
/// use robot_dash::protocol::message::{decode_envelope, Inbound};
///
/// let msg = r#"{"type":"TELEMETRY_UPDATE","section":"general","values":[],"timestamp":5}"#;
/// assert!(matches!(decode_envelope(msg), Ok(Inbound::Telemetry(_))));
/// assert!(decode_envelope(r#"{"section":"general"}"#).is_err());
/// ```
pub fn decode_envelope(text: &str) -> Result<Inbound, MalformedMessage> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| MalformedMessage::InvalidJson(e.to_string()))?;
    decode_value(value)
}

/// Classify an already-parsed JSON envelope.
pub fn decode_value(value: Value) -> Result<Inbound, MalformedMessage> {
    let obj = value.as_object().ok_or(MalformedMessage::NotAnObject)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(MalformedMessage::MissingType)?;
    let timestamp = parse_timestamp(obj.get("timestamp"));

    match kind {
        SUBSYSTEM_UPDATE => {
            let target = obj
                .get("subsystem")
                .and_then(Value::as_str)
                .ok_or(MalformedMessage::MissingTarget(SUBSYSTEM_UPDATE))?;
            let subsystem = target
                .parse::<SubsystemId>()
                .map_err(|_| MalformedMessage::UnknownTarget(target.to_string()))?;
            let data = match obj.get("data") {
                Some(data @ Value::Object(_)) => data.clone(),
                None | Some(Value::Null) => Value::Object(Default::default()),
                Some(_) => {
                    return Err(MalformedMessage::InvalidPayload("data must be an object".to_string()))
                }
            };
            Ok(Inbound::Subsystem(SubsystemEnvelope { subsystem, data, timestamp }))
        }
        TELEMETRY_UPDATE => {
            let target = obj
                .get("section")
                .and_then(Value::as_str)
                .ok_or(MalformedMessage::MissingTarget(TELEMETRY_UPDATE))?;
            let section = target
                .parse::<SectionId>()
                .map_err(|_| MalformedMessage::UnknownTarget(target.to_string()))?;
            let values = match obj.get("values") {
                Some(values) => Vec::<WireTelemetryValue>::deserialize(values)
                    .map_err(|e| MalformedMessage::InvalidPayload(e.to_string()))?,
                None => Vec::new(),
            };
            Ok(Inbound::Telemetry(TelemetryEnvelope { section, values, timestamp }))
        }
        other => {
            let kind = other.to_string();
            Ok(Inbound::PassThrough { kind, message: value })
        }
    }
}

fn parse_timestamp(value: Option<&Value>) -> Option<i64> {
    let value = value?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|t| t.round() as i64))
}
