//! # Recording Module
//!
//! Record and replay of telemetry sessions.

pub mod controller;
pub mod session;

pub use controller::{RecordingController, ReplayStep};
pub use session::{RecordedSample, Recording};
