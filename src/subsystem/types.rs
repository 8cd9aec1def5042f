//! # Subsystem Snapshot Types
//!
//! Full current state of each robot subsystem. Field names serialize in the
//! camelCase form the robot sends them in.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Identifies one of the five mirrored subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsystemId {
    Drivetrain,
    Intake,
    Deposit,
    Camera,
    General,
}

impl SubsystemId {
    /// Every subsystem, in display order.
    pub const ALL: [SubsystemId; 5] = [
        SubsystemId::Drivetrain,
        SubsystemId::Intake,
        SubsystemId::Deposit,
        SubsystemId::Camera,
        SubsystemId::General,
    ];

    /// Wire name (`"drivetrain"`, `"intake"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            SubsystemId::Drivetrain => "drivetrain",
            SubsystemId::Intake => "intake",
            SubsystemId::Deposit => "deposit",
            SubsystemId::Camera => "camera",
            SubsystemId::General => "general",
        }
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubsystemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubsystemId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown subsystem: {}", s))
    }
}

/// 3D vector (position in field units, velocity, acceleration)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// 2D vector (center of gravity offset)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// PID loop diagnostic record
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PidData {
    pub setpoint: f64,
    pub actual: f64,
    pub error: f64,
    pub output: f64,
    #[serde(rename = "kP", default)]
    pub k_p: f64,
    #[serde(rename = "kI", default)]
    pub k_i: f64,
    #[serde(rename = "kD", default)]
    pub k_d: f64,
    #[serde(default)]
    pub integral: f64,
    #[serde(default)]
    pub derivative: f64,
    #[serde(default)]
    pub timestamp: i64,
}

/// Named sensor reading attached to a subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
}

/// Drive motor encoder counts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoders {
    #[serde(default)]
    pub left_front: f64,
    #[serde(default)]
    pub right_front: f64,
    #[serde(default)]
    pub left_back: f64,
    #[serde(default)]
    pub right_back: f64,
}

/// One entry of the drivetrain's bounded position trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionHistoryEntry {
    pub position: Vector3,
    pub timestamp: i64,
}

/// Intake mechanism state.
///
/// Set verbatim from robot data; no transition rules are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntakeState {
    #[default]
    Idle,
    Extending,
    Retracting,
    Grabbing,
    Releasing,
}

/// Deposit mechanism state.
///
/// Set verbatim from robot data; no transition rules are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositState {
    #[default]
    Idle,
    Extending,
    Retracting,
    Depositing,
    Resetting,
}

/// Drivetrain snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivetrainSnapshot {
    pub position: Vector3,
    pub velocity: Vector3,
    pub acceleration: Vector3,
    /// Heading (rotation about z) in radians
    pub heading: f64,
    pub center_of_gravity: Vector2,
    pub encoders: Encoders,
    pub sensors: Vec<SensorData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_data: Option<PidData>,
    /// Oldest first
    pub position_history: VecDeque<PositionHistoryEntry>,
}

/// Lower slide travel limit for intake and deposit.
pub const DEFAULT_SLIDE_MIN: f64 = 0.0;
/// Upper slide travel limit for intake and deposit.
pub const DEFAULT_SLIDE_MAX: f64 = 100.0;

/// Intake snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeSnapshot {
    pub slide_position: f64,
    pub slide_target: f64,
    pub slide_min: f64,
    pub slide_max: f64,
    pub has_sample: bool,
    pub servo_position: f64,
    pub state: IntakeState,
    pub sensors: Vec<SensorData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_data: Option<PidData>,
}

impl Default for IntakeSnapshot {
    fn default() -> Self {
        Self {
            slide_position: 0.0,
            slide_target: 0.0,
            slide_min: DEFAULT_SLIDE_MIN,
            slide_max: DEFAULT_SLIDE_MAX,
            has_sample: false,
            servo_position: 0.0,
            state: IntakeState::default(),
            sensors: Vec::new(),
            pid_data: None,
        }
    }
}

/// Deposit snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositSnapshot {
    pub slide_position: f64,
    pub slide_target: f64,
    pub slide_min: f64,
    pub slide_max: f64,
    pub is_deposited: bool,
    pub state: DepositState,
    pub sensors: Vec<SensorData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid_data: Option<PidData>,
}

impl Default for DepositSnapshot {
    fn default() -> Self {
        Self {
            slide_position: 0.0,
            slide_target: 0.0,
            slide_min: DEFAULT_SLIDE_MIN,
            slide_max: DEFAULT_SLIDE_MAX,
            is_deposited: false,
            state: DepositState::default(),
            sensors: Vec::new(),
            pid_data: None,
        }
    }
}

/// Object reported by the vision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Camera frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self { width: 640, height: 480 }
    }
}

/// Camera snapshot (metadata only; frames are decoded elsewhere)
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSnapshot {
    pub detected_objects: Vec<DetectedObject>,
    pub frame_rate: f64,
    pub processing_time: f64,
    pub resolution: Resolution,
}

/// Match period reported by the robot controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMode {
    Auto,
    Teleop,
    #[default]
    Stopped,
}

/// Match timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTimer {
    #[serde(default)]
    pub mode: MatchMode,
    /// Seconds
    #[serde(default)]
    pub time_remaining: f64,
    /// Seconds
    #[serde(default = "default_match_length")]
    pub total_time: f64,
    #[serde(default)]
    pub is_running: bool,
}

fn default_match_length() -> f64 { 150.0 }

impl Default for MatchTimer {
    fn default() -> Self {
        Self {
            mode: MatchMode::Stopped,
            time_remaining: 0.0,
            total_time: default_match_length(),
            is_running: false,
        }
    }
}

/// Power and match status
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSnapshot {
    pub voltage: f64,
    pub current: f64,
    pub battery_percentage: f64,
    pub match_timer: MatchTimer,
}

impl Default for GeneralSnapshot {
    fn default() -> Self {
        Self {
            voltage: 12.0,
            current: 0.0,
            battery_percentage: 100.0,
            match_timer: MatchTimer::default(),
        }
    }
}
