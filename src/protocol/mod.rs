//! # Robot Protocol Module
//!
//! JSON messages exchanged with the robot.
//!
//! This module handles:
//! - Classifying inbound envelopes (subsystem update, telemetry update, pass-through)
//! - Rejecting malformed envelopes with a reason
//! - Encoding outbound commands

pub mod command;
pub mod message;

pub use command::Command;
pub use message::{decode_envelope, Inbound, MalformedMessage};
