//! # Telemetry Types
//!
//! Sections, keyed values and the value union carried by `TELEMETRY_UPDATE`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one of the fixed telemetry sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Drivetrain,
    Intake,
    Deposit,
    Claw,
    General,
}

impl SectionId {
    /// Every section, in display order
    pub const ALL: [SectionId; 5] = [
        SectionId::Drivetrain,
        SectionId::Intake,
        SectionId::Deposit,
        SectionId::Claw,
        SectionId::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Drivetrain => "drivetrain",
            SectionId::Intake => "intake",
            SectionId::Deposit => "deposit",
            SectionId::Claw => "claw",
            SectionId::General => "general",
        }
    }

    /// Fixed display name
    pub fn display_name(&self) -> &'static str {
        match self {
            SectionId::Drivetrain => "Drivetrain",
            SectionId::Intake => "Intake",
            SectionId::Deposit => "Deposit",
            SectionId::Claw => "Claw",
            SectionId::General => "General",
        }
    }

    /// Position in [`SectionId::ALL`]
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown section: {}", s))
    }
}

/// A telemetry reading: string, number or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryData {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl TelemetryData {
    /// Numeric value, if this reading is graphable
    pub fn as_number(&self) -> Option<f64> {
        match self {
            TelemetryData::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for TelemetryData {
    fn from(v: f64) -> Self {
        TelemetryData::Number(v)
    }
}

impl From<bool> for TelemetryData {
    fn from(v: bool) -> Self {
        TelemetryData::Bool(v)
    }
}

impl From<&str> for TelemetryData {
    fn from(v: &str) -> Self {
        TelemetryData::Text(v.to_string())
    }
}

/// A stamped telemetry value, unique per (section, key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryValue {
    pub key: String,
    pub value: TelemetryData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub timestamp: i64,
}

impl TelemetryValue {
    pub fn new(key: impl Into<String>, value: impl Into<TelemetryData>, timestamp: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            unit: None,
            timestamp,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

/// A named group of telemetry values.
///
/// Values keep first-insertion order; writing an existing key replaces the
/// value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySection {
    id: SectionId,
    values: Vec<TelemetryValue>,
    pub collapsed: bool,
    pub visible: bool,
}

impl TelemetrySection {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            values: Vec::new(),
            collapsed: false,
            visible: true,
        }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.display_name()
    }

    /// Values in insertion order
    pub fn values(&self) -> &[TelemetryValue] {
        &self.values
    }

    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        self.values.iter().find(|v| v.key == key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Insert or overwrite by key
    pub(crate) fn upsert(&mut self, value: TelemetryValue) {
        match self.values.iter_mut().find(|v| v.key == value.key) {
            Some(slot) => *slot = value,
            None => self.values.push(value),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    /// Point-in-time copy in export form
    pub fn snapshot(&self) -> SectionSnapshot {
        SectionSnapshot {
            id: self.id,
            name: self.name().to_string(),
            values: self
                .values
                .iter()
                .map(|v| (v.key.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Serializable copy of a section: `{id, name, values: [[key, record], ...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub id: SectionId,
    pub name: String,
    pub values: Vec<(String, TelemetryValue)>,
}

/// A section update held back while the display is paused.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPacket {
    pub section: SectionId,
    pub values: Vec<TelemetryValue>,
    /// Arrival time at the store (epoch ms)
    pub arrived_at: i64,
}
