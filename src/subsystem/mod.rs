//! # Subsystem Module
//!
//! Mirrors the state of each robot subsystem.
//!
//! This module handles:
//! - Snapshot types for drivetrain, intake, deposit, camera and general status
//! - Optional-field update structs decoded from `SUBSYSTEM_UPDATE` payloads
//! - Field-local merging and the bounded drivetrain position trail

pub mod types;
pub mod update;
pub mod store;

pub use store::SubsystemStore;
pub use types::SubsystemId;
pub use update::SubsystemUpdate;
