//! # Partial Subsystem Updates
//!
//! One optional-field struct per subsystem. A field that is `Some` replaces
//! the snapshot field wholesale; a field that is `None` (absent or `null`
//! in the JSON) leaves the snapshot untouched. Unknown JSON fields are
//! ignored.

use serde::Deserialize;
use serde_json::Value;

use super::types::*;

/// Partial drivetrain update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrivetrainUpdate {
    pub position: Option<Vector3>,
    pub velocity: Option<Vector3>,
    pub acceleration: Option<Vector3>,
    pub heading: Option<f64>,
    pub center_of_gravity: Option<Vector2>,
    pub encoders: Option<Encoders>,
    pub sensors: Option<Vec<SensorData>>,
    pub pid_data: Option<PidData>,
}

/// Partial intake update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeUpdate {
    pub slide_position: Option<f64>,
    pub slide_target: Option<f64>,
    pub slide_min: Option<f64>,
    pub slide_max: Option<f64>,
    pub has_sample: Option<bool>,
    pub servo_position: Option<f64>,
    pub state: Option<IntakeState>,
    pub sensors: Option<Vec<SensorData>>,
    pub pid_data: Option<PidData>,
}

/// Partial deposit update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositUpdate {
    pub slide_position: Option<f64>,
    pub slide_target: Option<f64>,
    pub slide_min: Option<f64>,
    pub slide_max: Option<f64>,
    pub is_deposited: Option<bool>,
    pub state: Option<DepositState>,
    pub sensors: Option<Vec<SensorData>>,
    pub pid_data: Option<PidData>,
}

/// Partial camera update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraUpdate {
    pub detected_objects: Option<Vec<DetectedObject>>,
    pub frame_rate: Option<f64>,
    pub processing_time: Option<f64>,
    pub resolution: Option<Resolution>,
}

/// Partial general (power/match) update
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralUpdate {
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub battery_percentage: Option<f64>,
    pub match_timer: Option<MatchTimer>,
}

/// A typed partial update addressed to one subsystem.
#[derive(Debug, Clone, PartialEq)]
pub enum SubsystemUpdate {
    Drivetrain(DrivetrainUpdate),
    Intake(IntakeUpdate),
    Deposit(DepositUpdate),
    Camera(CameraUpdate),
    General(GeneralUpdate),
}

impl SubsystemUpdate {
    /// Decode the `data` object of a `SUBSYSTEM_UPDATE` envelope.
    ///
    /// # Errors
    ///
    /// Returns error if a known field has the wrong shape (e.g. an
    /// unrecognized mechanism state name).
    pub fn from_json(subsystem: SubsystemId, data: &Value) -> serde_json::Result<Self> {
        Ok(match subsystem {
            SubsystemId::Drivetrain => Self::Drivetrain(DrivetrainUpdate::deserialize(data)?),
            SubsystemId::Intake => Self::Intake(IntakeUpdate::deserialize(data)?),
            SubsystemId::Deposit => Self::Deposit(DepositUpdate::deserialize(data)?),
            SubsystemId::Camera => Self::Camera(CameraUpdate::deserialize(data)?),
            SubsystemId::General => Self::General(GeneralUpdate::deserialize(data)?),
        })
    }
}

fn merge<T>(slot: &mut T, update: Option<T>) {
    if let Some(value) = update {
        *slot = value;
    }
}

impl DrivetrainUpdate {
    /// Merge into `snapshot`. Position history is maintained by the store.
    pub(crate) fn apply_to(self, snapshot: &mut DrivetrainSnapshot) {
        merge(&mut snapshot.position, self.position);
        merge(&mut snapshot.velocity, self.velocity);
        merge(&mut snapshot.acceleration, self.acceleration);
        merge(&mut snapshot.heading, self.heading);
        merge(&mut snapshot.center_of_gravity, self.center_of_gravity);
        merge(&mut snapshot.encoders, self.encoders);
        merge(&mut snapshot.sensors, self.sensors);
        if self.pid_data.is_some() {
            snapshot.pid_data = self.pid_data;
        }
    }
}

impl IntakeUpdate {
    pub(crate) fn apply_to(self, snapshot: &mut IntakeSnapshot) {
        merge(&mut snapshot.slide_position, self.slide_position);
        merge(&mut snapshot.slide_target, self.slide_target);
        merge(&mut snapshot.slide_min, self.slide_min);
        merge(&mut snapshot.slide_max, self.slide_max);
        merge(&mut snapshot.has_sample, self.has_sample);
        merge(&mut snapshot.servo_position, self.servo_position);
        merge(&mut snapshot.state, self.state);
        merge(&mut snapshot.sensors, self.sensors);
        if self.pid_data.is_some() {
            snapshot.pid_data = self.pid_data;
        }
    }
}

impl DepositUpdate {
    pub(crate) fn apply_to(self, snapshot: &mut DepositSnapshot) {
        merge(&mut snapshot.slide_position, self.slide_position);
        merge(&mut snapshot.slide_target, self.slide_target);
        merge(&mut snapshot.slide_min, self.slide_min);
        merge(&mut snapshot.slide_max, self.slide_max);
        merge(&mut snapshot.is_deposited, self.is_deposited);
        merge(&mut snapshot.state, self.state);
        merge(&mut snapshot.sensors, self.sensors);
        if self.pid_data.is_some() {
            snapshot.pid_data = self.pid_data;
        }
    }
}

impl CameraUpdate {
    pub(crate) fn apply_to(self, snapshot: &mut CameraSnapshot) {
        merge(&mut snapshot.detected_objects, self.detected_objects);
        merge(&mut snapshot.frame_rate, self.frame_rate);
        merge(&mut snapshot.processing_time, self.processing_time);
        merge(&mut snapshot.resolution, self.resolution);
    }
}

impl GeneralUpdate {
    pub(crate) fn apply_to(self, snapshot: &mut GeneralSnapshot) {
        merge(&mut snapshot.voltage, self.voltage);
        merge(&mut snapshot.current, self.current);
        merge(&mut snapshot.battery_percentage, self.battery_percentage);
        merge(&mut snapshot.match_timer, self.match_timer);
    }
}

/// Collect every numeric leaf of a JSON object as `(dot.path, value)`.
///
/// Used to match subsystem fields against graph data keys such as
/// `drivetrain.position.x` or `intake.slidePosition`. Arrays are skipped.
pub fn numeric_leaves(prefix: &str, data: &Value) -> Vec<(String, f64)> {
    let mut leaves = Vec::new();
    collect_leaves(prefix, data, &mut leaves);
    leaves
}

fn collect_leaves(path: &str, value: &Value, out: &mut Vec<(String, f64)>) {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                out.push((path.to_string(), v));
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                collect_leaves(&format!("{}.{}", path, key), child, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_partial_drivetrain() {
        let data = json!({"heading": 1.57, "velocity": {"x": 1.0, "y": 2.0, "z": 0.0}});
        let update = SubsystemUpdate::from_json(SubsystemId::Drivetrain, &data).unwrap();
        match update {
            SubsystemUpdate::Drivetrain(u) => {
                assert_eq!(u.heading, Some(1.57));
                assert_eq!(u.velocity, Some(Vector3::new(1.0, 2.0, 0.0)));
                assert!(u.position.is_none());
            }
            other => panic!("Expected drivetrain update, got: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let data = json!({"voltage": 11.8, "somethingNew": true});
        let update = SubsystemUpdate::from_json(SubsystemId::General, &data).unwrap();
        assert_eq!(
            update,
            SubsystemUpdate::General(GeneralUpdate { voltage: Some(11.8), ..Default::default() })
        );
    }

    #[test]
    fn test_null_field_is_treated_as_absent() {
        let data = json!({"slidePosition": null, "hasSample": true});
        let update = SubsystemUpdate::from_json(SubsystemId::Intake, &data).unwrap();
        let mut snapshot = IntakeSnapshot { slide_position: 42.0, ..Default::default() };
        if let SubsystemUpdate::Intake(u) = update {
            u.apply_to(&mut snapshot);
        }
        assert_eq!(snapshot.slide_position, 42.0);
        assert!(snapshot.has_sample);
    }

    #[test]
    fn test_unknown_state_name_is_rejected() {
        let data = json!({"state": "FLYING"});
        assert!(SubsystemUpdate::from_json(SubsystemId::Deposit, &data).is_err());
    }

    #[test]
    fn test_any_state_reachable_from_any_state() {
        let mut snapshot = DepositSnapshot { state: DepositState::Depositing, ..Default::default() };
        DepositUpdate { state: Some(DepositState::Idle), ..Default::default() }.apply_to(&mut snapshot);
        assert_eq!(snapshot.state, DepositState::Idle);
        DepositUpdate { state: Some(DepositState::Resetting), ..Default::default() }.apply_to(&mut snapshot);
        assert_eq!(snapshot.state, DepositState::Resetting);
    }

    #[test]
    fn test_numeric_leaves_flatten_nested_objects() {
        let data = json!({
            "position": {"x": 1.5, "y": -2.0, "z": 0},
            "heading": 0.25,
            "sensors": [{"name": "dist", "value": 3.0}],
            "label": "ignored"
        });
        let mut leaves = numeric_leaves("drivetrain", &data);
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            leaves,
            vec![
                ("drivetrain.heading".to_string(), 0.25),
                ("drivetrain.position.x".to_string(), 1.5),
                ("drivetrain.position.y".to_string(), -2.0),
                ("drivetrain.position.z".to_string(), 0.0),
            ]
        );
    }
}
