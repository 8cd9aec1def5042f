//! # Telemetry Module
//!
//! Keyed telemetry sections with pause, buffer and resume.
//!
//! This module handles:
//! - The fixed set of sections (drivetrain, intake, deposit, claw, general)
//! - Per-key overwrite merging of `TELEMETRY_UPDATE` packets
//! - Buffering packets while the display is paused (bounded, oldest dropped)
//! - The index of graphable (numeric) keys

pub mod types;
pub mod buffer;
pub mod store;

pub use buffer::PauseBuffer;
pub use store::{SectionWrite, TelemetryStore};
pub use types::{SectionId, SectionSnapshot, TelemetryData, TelemetrySection, TelemetryValue};
