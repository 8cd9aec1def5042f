//! # Robot Dash Library
//!
//! Live dashboard state engine for a competition robot.
//!
//! This library ingests the robot's stream of subsystem and telemetry
//! updates and maintains the state a dashboard renders: per-subsystem
//! snapshots, keyed telemetry sections with pause/resume, sliding-window
//! chart series, and record/replay of telemetry sessions.
//!
//! ## Usage
//!
//! ```
//! use robot_dash::clock::ManualClock;
//! use robot_dash::dashboard::{Dashboard, DashboardSettings};
//! use robot_dash::telemetry::SectionId;
//!
//! let mut dash = Dashboard::new(DashboardSettings::default(), Box::new(ManualClock::new(0)));
//! dash.handle_text(r#"{"type":"TELEMETRY_UPDATE","section":"drivetrain","values":[{"key":"a","value":1}],"timestamp":0}"#);
//! assert_eq!(dash.telemetry().section(SectionId::Drivetrain).len(), 1);
//! assert_eq!(dash.graphable_keys(), &["drivetrain.a".to_string()]);
//! ```

pub mod clock;
pub mod config;
pub mod connection;
pub mod console;
pub mod dashboard;
pub mod error;
pub mod graph;
pub mod protocol;
pub mod recording;
pub mod router;
pub mod subsystem;
pub mod telemetry;
