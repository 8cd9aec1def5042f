//! # Message Router
//!
//! Classifies inbound envelopes and dispatches them to the stores.
//!
//! This module handles:
//! - `SUBSYSTEM_UPDATE`: typed merge into the subsystem store, then feeds the
//!   built-in rolling charts and any graph bound to a numeric field
//! - `TELEMETRY_UPDATE`: stamps every value with the envelope timestamp,
//!   writes (or buffers) the section, captures a recording frame, and feeds
//!   graphs bound to `section.key`
//! - Anything else: passed through without touching state
//!
//! A malformed envelope is logged and dropped. The router holds no state.

use serde_json::Value;
use tracing::{debug, warn};

use crate::graph::{GraphSample, GraphStore};
use crate::protocol::message::{decode_envelope, Inbound, SubsystemEnvelope, TelemetryEnvelope};
use crate::protocol::MalformedMessage;
use crate::recording::RecordingController;
use crate::subsystem::types::PidData;
use crate::subsystem::update::numeric_leaves;
use crate::subsystem::{SubsystemId, SubsystemStore, SubsystemUpdate};
use crate::telemetry::{SectionId, SectionWrite, TelemetryStore, TelemetryValue};

/// The state the router writes into
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub subsystems: SubsystemStore,
    pub telemetry: TelemetryStore,
    pub graphs: GraphStore,
    pub recorder: RecordingController,
}

/// What happened to one inbound envelope
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Merged into a subsystem snapshot
    Subsystem(SubsystemId),
    /// Written to a section, or buffered while paused
    Telemetry { section: SectionId, write: SectionWrite },
    /// Not a state update; handed to the presentation layer unchanged
    PassThrough { kind: String, message: Value },
    /// Dropped without mutation
    Dropped(MalformedMessage),
}

/// Stateless envelope dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Router;

impl Router {
    pub fn new() -> Self {
        Self
    }

    /// Decode one line of JSON and dispatch it.
    ///
    /// # Arguments
    ///
    /// * `text` - Raw envelope text
    /// * `stores` - Stores to mutate
    /// * `now` - Arrival time (epoch ms)
    pub fn dispatch_text(&self, text: &str, stores: &mut Stores, now: i64) -> RouteOutcome {
        match decode_envelope(text) {
            Ok(inbound) => self.dispatch(inbound, stores, now),
            Err(e) => {
                warn!("Dropping malformed message: {}", e);
                RouteOutcome::Dropped(e)
            }
        }
    }

    /// Dispatch a decoded envelope.
    ///
    /// An envelope without a timestamp is stamped with `now`.
    pub fn dispatch(&self, inbound: Inbound, stores: &mut Stores, now: i64) -> RouteOutcome {
        match inbound {
            Inbound::Subsystem(envelope) => self.route_subsystem(envelope, stores, now),
            Inbound::Telemetry(envelope) => self.route_telemetry(envelope, stores, now),
            Inbound::PassThrough { kind, message } => {
                debug!("Passing through {} message", kind);
                RouteOutcome::PassThrough { kind, message }
            }
        }
    }

    fn route_subsystem(&self, envelope: SubsystemEnvelope, stores: &mut Stores, now: i64) -> RouteOutcome {
        let SubsystemEnvelope { subsystem, data, timestamp } = envelope;
        let timestamp = timestamp.unwrap_or(now);

        let update = match SubsystemUpdate::from_json(subsystem, &data) {
            Ok(update) => update,
            Err(e) => {
                warn!("Dropping {} update: {}", subsystem, e);
                return RouteOutcome::Dropped(MalformedMessage::InvalidPayload(e.to_string()));
            }
        };

        feed_rolling_series(&update, timestamp, &mut stores.graphs);
        stores.subsystems.merge_update(update, now);

        for (path, value) in numeric_leaves(subsystem.as_str(), &data) {
            feed_graphs(&mut stores.graphs, &path, GraphSample::new(timestamp, value));
        }

        RouteOutcome::Subsystem(subsystem)
    }

    fn route_telemetry(&self, envelope: TelemetryEnvelope, stores: &mut Stores, now: i64) -> RouteOutcome {
        let TelemetryEnvelope { section, values, timestamp } = envelope;
        let timestamp = timestamp.unwrap_or(now);

        let values: Vec<TelemetryValue> = values.into_iter().map(|v| v.stamp(timestamp)).collect();
        let numeric: Vec<(String, f64)> = values
            .iter()
            .filter_map(|v| v.value.as_number().map(|n| (format!("{}.{}", section, v.key), n)))
            .collect();

        let write = stores.telemetry.update_section(section, values, now);
        if write == SectionWrite::Applied && stores.recorder.is_recording() {
            let snapshot = stores.telemetry.section(section).snapshot();
            stores.recorder.capture(now, vec![snapshot]);
        }

        for (key, value) in numeric {
            feed_graphs(&mut stores.graphs, &key, GraphSample::new(timestamp, value));
        }

        RouteOutcome::Telemetry { section, write }
    }
}

/// Append `sample` to every visible graph plotting `data_key`.
fn feed_graphs(graphs: &mut GraphStore, data_key: &str, sample: GraphSample) {
    let targets: Vec<String> = graphs.graphs_for_key(data_key).map(str::to_owned).collect();
    for id in targets {
        graphs.append_sample(&id, sample);
    }
}

/// Feed the count-bounded series behind the built-in subsystem charts.
fn feed_rolling_series(update: &SubsystemUpdate, timestamp: i64, graphs: &mut GraphStore) {
    let mut push = |id: &str, value: f64| graphs.append_rolling(id, GraphSample::new(timestamp, value));

    match update {
        SubsystemUpdate::Drivetrain(u) => {
            if let Some(position) = u.position {
                push("drivetrain-x", position.x);
                push("drivetrain-y", position.y);
            }
            if let Some(velocity) = u.velocity {
                push("drivetrain-velocity", velocity.magnitude());
            }
            if let Some(acceleration) = u.acceleration {
                push("drivetrain-acceleration", acceleration.magnitude());
            }
        }
        SubsystemUpdate::Intake(u) => {
            if let Some(pid) = &u.pid_data {
                push_pid("intake", pid, &mut push);
            }
        }
        SubsystemUpdate::Deposit(u) => {
            if let Some(pid) = &u.pid_data {
                push_pid("deposit", pid, &mut push);
            }
        }
        SubsystemUpdate::General(u) => {
            if let Some(voltage) = u.voltage {
                push("general-voltage", voltage);
            }
            if let Some(current) = u.current {
                push("general-current", current);
            }
        }
        SubsystemUpdate::Camera(_) => {}
    }
}

fn push_pid(prefix: &str, pid: &PidData, push: &mut impl FnMut(&str, f64)) {
    push(&format!("{}-pid-error", prefix), pid.error);
    push(&format!("{}-pid-output", prefix), pid.output);
    push(&format!("{}-pid-setpoint", prefix), pid.setpoint);
    push(&format!("{}-pid-actual", prefix), pid.actual);
}
