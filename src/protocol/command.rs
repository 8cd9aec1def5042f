//! # Outbound Commands
//!
//! Fire-and-forget commands sent to the robot as single JSON lines. The
//! robot does not acknowledge them.

use serde::Serialize;

use crate::error::Result;

/// A command intent for the robot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Move the intake slide to `payload`
    SetIntakeSlideTarget { payload: f64 },
    /// Move the deposit slide to `payload`
    SetDepositSlideTarget { payload: f64 },
    /// Status poll; the robot answers with `RECEIVE_ROBOT_STATUS`
    GetRobotStatus,
    InitOpMode {
        #[serde(rename = "opModeName")]
        op_mode_name: String,
    },
    StartOpMode,
    StopOpMode,
}

impl Command {
    /// Encode as one line of JSON (no trailing newline)
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
