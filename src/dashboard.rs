//! # Dashboard
//!
//! Single owner of the dashboard state. Every mutation goes through one of
//! three writers: inbound messages ([`Dashboard::handle_text`]), the
//! pause/resume toggle, and the replay tick. Everything else is a UI command
//! or a read-only view.
//!
//! The host (the binary, or a UI) drives the dashboard:
//! - feed every received line to [`Dashboard::handle_text`]
//! - while [`Dashboard::is_replaying`], call [`Dashboard::replay_tick`] every
//!   [`Dashboard::replay_interval`]
//! - send whatever [`Dashboard::drain_commands`] returns to the robot

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{DashError, Result};
use crate::graph::{GraphConfig, GraphStore};
use crate::protocol::message::RECEIVE_ROBOT_STATUS;
use crate::protocol::Command;
use crate::recording::{Recording, RecordingController, ReplayStep};
use crate::router::{RouteOutcome, Router, Stores};
use crate::subsystem::SubsystemStore;
use crate::telemetry::{SectionId, TelemetrySection, TelemetryStore};

/// Tunables the state engine needs from the configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    pub pause_buffer_size: usize,
    pub position_history_cap: usize,
    pub rolling_capacity: usize,
    /// Window applied by [`Dashboard::add_graph_for_key`]
    pub default_time_window_s: u32,
    pub replay_tick: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for DashboardSettings {
    fn from(config: &Config) -> Self {
        Self {
            pause_buffer_size: config.telemetry.pause_buffer_size,
            position_history_cap: config.subsystems.position_history_cap,
            rolling_capacity: config.graphs.rolling_capacity,
            default_time_window_s: config.graphs.default_time_window_s,
            replay_tick: Duration::from_millis(config.replay.tick_ms),
        }
    }
}

/// Link state as seen by the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    /// Round trip of the last status poll
    pub ping_ms: Option<i64>,
    /// Last `RECEIVE_ROBOT_STATUS` message
    pub robot_status: Option<Value>,
    #[serde(skip)]
    status_sent_at: Option<i64>,
}

/// Point-in-time summary of the dashboard modes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatus {
    pub paused: bool,
    pub paused_at: Option<i64>,
    pub buffered_packets: usize,
    pub dropped_packets: u64,
    pub recording: bool,
    pub recorded_samples: Option<usize>,
    pub replaying: bool,
    pub recordings: usize,
    pub graphs: usize,
    pub connected: bool,
    pub ping_ms: Option<i64>,
}

/// Dashboard state engine.
pub struct Dashboard {
    stores: Stores,
    router: Router,
    clock: Box<dyn Clock>,
    settings: DashboardSettings,
    outbox: Vec<Command>,
    connection: ConnectionStatus,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("settings", &self.settings)
            .field("connection", &self.connection)
            .field("queued_commands", &self.outbox.len())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Create a dashboard with empty stores.
    ///
    /// # Arguments
    ///
    /// * `settings` - Buffer sizes, caps and replay tick
    /// * `clock` - Source of arrival timestamps
    pub fn new(settings: DashboardSettings, clock: Box<dyn Clock>) -> Self {
        let stores = Stores {
            subsystems: SubsystemStore::new(settings.position_history_cap),
            telemetry: TelemetryStore::new(settings.pause_buffer_size),
            graphs: GraphStore::new(settings.rolling_capacity),
            recorder: RecordingController::new(settings.replay_tick),
        };
        Self {
            stores,
            router: Router::new(),
            clock,
            settings,
            outbox: Vec::new(),
            connection: ConnectionStatus::default(),
        }
    }

    /// Create a dashboard from loaded configuration, on the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::new(DashboardSettings::from(config), Box::new(SystemClock))
    }

    // ---- inbound --------------------------------------------------------

    /// Apply one line received from the robot.
    ///
    /// Never fails; malformed input is reported as [`RouteOutcome::Dropped`].
    pub fn handle_text(&mut self, text: &str) -> RouteOutcome {
        let now = self.clock.now_ms();
        let outcome = self.router.dispatch_text(text, &mut self.stores, now);
        if let RouteOutcome::PassThrough { kind, message } = &outcome {
            if kind == RECEIVE_ROBOT_STATUS {
                self.record_status_reply(message.clone(), now);
            }
        }
        outcome
    }

    fn record_status_reply(&mut self, message: Value, now: i64) {
        if let Some(sent_at) = self.connection.status_sent_at.take() {
            let ping = now - sent_at;
            debug!("Robot status round trip {} ms", ping);
            self.connection.ping_ms = Some(ping);
        }
        self.connection.robot_status = Some(message);
    }

    // ---- pause ----------------------------------------------------------

    /// Flip between live and paused display.
    ///
    /// Resuming during a recording captures one frame holding every section
    /// the buffered packets touched.
    ///
    /// # Returns
    ///
    /// * `bool` - The new paused state
    pub fn toggle_pause(&mut self) -> bool {
        let now = self.clock.now_ms();
        let touched = if self.stores.telemetry.is_paused() {
            self.stores.telemetry.buffered_sections()
        } else {
            Vec::new()
        };

        let paused = self.stores.telemetry.toggle_pause(now);
        if !touched.is_empty() && self.stores.recorder.is_recording() {
            let snapshots = touched
                .into_iter()
                .map(|id| self.stores.telemetry.section(id).snapshot())
                .collect();
            self.stores.recorder.capture(now, snapshots);
        }
        paused
    }

    // ---- recording / replay --------------------------------------------

    /// See [`RecordingController::start_recording`]
    pub fn start_recording(&mut self) -> bool {
        let now = self.clock.now_ms();
        self.stores.recorder.start_recording(now)
    }

    /// See [`RecordingController::stop_recording`]
    pub fn stop_recording(&mut self) -> Option<usize> {
        self.stores.recorder.stop_recording()
    }

    /// See [`RecordingController::start_replay`]
    pub fn start_replay(&mut self, index: usize) -> bool {
        self.stores.recorder.start_replay(index)
    }

    /// Cancel replay. Applied samples are not reverted.
    pub fn stop_replay(&mut self) -> bool {
        self.stores.recorder.stop_replay()
    }

    /// Apply the next replay sample to the section display.
    ///
    /// Replayed values replace the recorded sections' values directly. They
    /// are not buffered by pause and are not captured by a recording.
    pub fn replay_tick(&mut self) -> ReplayStep {
        let step = self.stores.recorder.replay_tick();
        if let ReplayStep::Apply(sample) = &step {
            for section in &sample.sections {
                self.stores.telemetry.restore_section(section);
            }
        }
        step
    }

    /// Period between [`replay_tick`](Self::replay_tick) calls
    pub fn replay_interval(&self) -> Duration {
        self.stores.recorder.tick()
    }

    /// Serialize a completed recording.
    ///
    /// # Errors
    ///
    /// Returns `RecordingNotFound` for an invalid index
    pub fn export_recording(&self, index: usize) -> Result<String> {
        self.stores.recorder.export(index)
    }

    /// Write a completed recording to `dir` under its export file name.
    ///
    /// # Returns
    ///
    /// * `Result<PathBuf>` - Path of the written file
    ///
    /// # Errors
    ///
    /// Returns error if the index is invalid or the file cannot be written
    pub fn export_recording_to_file<P: AsRef<Path>>(&self, index: usize, dir: P) -> Result<PathBuf> {
        let recording = self
            .stores
            .recorder
            .recordings()
            .get(index)
            .ok_or(DashError::RecordingNotFound(index))?;
        let path = dir.as_ref().join(recording.file_name());
        fs::write(&path, recording.to_json()?)?;
        info!("Exported recording {} to {}", index, path.display());
        Ok(path)
    }

    /// Load an exported recording file into the completed list.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or decoded
    pub fn import_recording<P: AsRef<Path>>(&mut self, path: P) -> Result<Option<usize>> {
        let text = fs::read_to_string(path)?;
        let recording = Recording::from_json(&text)?;
        Ok(self.stores.recorder.import(recording))
    }

    // ---- graphs ---------------------------------------------------------

    /// Register a graph; re-adding an id resets its series.
    pub fn add_graph(&mut self, config: GraphConfig) {
        self.stores.graphs.add_graph(config);
    }

    /// Register a graph on `data_key` with the configured default window.
    pub fn add_graph_for_key(&mut self, id: &str, title: &str, data_key: &str) {
        let config = GraphConfig::new(id, title, data_key, self.settings.default_time_window_s);
        self.stores.graphs.add_graph(config);
    }

    pub fn remove_graph(&mut self, id: &str) -> bool {
        self.stores.graphs.remove_graph(id)
    }

    pub fn set_graph_visible(&mut self, id: &str, visible: bool) -> bool {
        self.stores.graphs.set_visible(id, visible)
    }

    // ---- sections -------------------------------------------------------

    pub fn set_section_visible(&mut self, id: SectionId, visible: bool) {
        self.stores.telemetry.set_visible(id, visible);
    }

    pub fn set_section_collapsed(&mut self, id: SectionId, collapsed: bool) {
        self.stores.telemetry.set_collapsed(id, collapsed);
    }

    /// Return every store to its initial contents.
    ///
    /// Subsystems go back to defaults, section values, the pause buffer and
    /// all graph samples are cleared. Graph configs, completed recordings,
    /// pause mode and section flags are kept.
    pub fn reset_session(&mut self) {
        self.stores.subsystems.reset_all();
        self.stores.telemetry.clear();
        self.stores.graphs.clear_samples();
        info!("Session reset");
    }

    // ---- commands and link ----------------------------------------------

    /// Queue a command for the robot.
    ///
    /// # Returns
    ///
    /// * `bool` - false if the robot is disconnected and the command was dropped
    pub fn queue_command(&mut self, command: Command) -> bool {
        if !self.connection.connected {
            warn!("Not connected, dropping {:?}", command);
            return false;
        }
        if command == Command::GetRobotStatus {
            self.connection.status_sent_at = Some(self.clock.now_ms());
        }
        self.outbox.push(command);
        true
    }

    /// Take every queued command, oldest first
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    /// Record a link state change. Disconnecting discards queued commands.
    pub fn set_connected(&mut self, connected: bool) {
        if self.connection.connected == connected {
            return;
        }
        self.connection.connected = connected;
        if connected {
            info!("Robot connected");
        } else {
            if !self.outbox.is_empty() {
                warn!("Robot disconnected, discarding {} queued commands", self.outbox.len());
            } else {
                info!("Robot disconnected");
            }
            self.outbox.clear();
            self.connection.status_sent_at = None;
        }
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    // ---- read-only views --------------------------------------------------

    pub fn subsystems(&self) -> &SubsystemStore {
        &self.stores.subsystems
    }

    pub fn telemetry(&self) -> &TelemetryStore {
        &self.stores.telemetry
    }

    pub fn sections(&self) -> &[TelemetrySection] {
        self.stores.telemetry.sections()
    }

    pub fn graphable_keys(&self) -> &[String] {
        self.stores.telemetry.graphable_keys()
    }

    pub fn graphs(&self) -> &GraphStore {
        &self.stores.graphs
    }

    pub fn recordings(&self) -> &[Recording] {
        self.stores.recorder.recordings()
    }

    pub fn is_paused(&self) -> bool {
        self.stores.telemetry.is_paused()
    }

    pub fn is_recording(&self) -> bool {
        self.stores.recorder.is_recording()
    }

    pub fn is_replaying(&self) -> bool {
        self.stores.recorder.is_replaying()
    }

    pub fn status(&self) -> DashboardStatus {
        let telemetry = &self.stores.telemetry;
        let recorder = &self.stores.recorder;
        DashboardStatus {
            paused: telemetry.is_paused(),
            paused_at: telemetry.paused_at(),
            buffered_packets: telemetry.buffer().len(),
            dropped_packets: telemetry.buffer().dropped(),
            recording: recorder.is_recording(),
            recorded_samples: recorder.active_len(),
            replaying: recorder.is_replaying(),
            recordings: recorder.recordings().len(),
            graphs: self.stores.graphs.len(),
            connected: self.connection.connected,
            ping_ms: self.connection.ping_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, MockClock};
    use crate::telemetry::TelemetryData;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn dashboard() -> (Dashboard, ManualClock) {
        let clock = ManualClock::new(10_000);
        let dash = Dashboard::new(DashboardSettings::default(), Box::new(clock.clone()));
        (dash, clock)
    }

    fn telemetry(section: &str, key: &str, value: f64, ts: i64) -> String {
        format!(
            r#"{{"type":"TELEMETRY_UPDATE","section":"{}","values":[{{"key":"{}","value":{}}}],"timestamp":{}}}"#,
            section, key, value, ts
        )
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config::from_toml_str("[replay]\ntick_ms = 250\n[telemetry]\npause_buffer_size = 3").unwrap();
        let settings = DashboardSettings::from(&config);
        assert_eq!(settings.replay_tick, Duration::from_millis(250));
        assert_eq!(settings.pause_buffer_size, 3);
        assert_eq!(settings.position_history_cap, 100);

        let dash = Dashboard::from_config(&config);
        assert_eq!(dash.replay_interval(), Duration::from_millis(250));
        assert_eq!(dash.telemetry().buffer().capacity(), 3);
    }

    #[test]
    fn test_replay_restores_recorded_sections() {
        let (mut dash, clock) = dashboard();
        assert!(dash.start_recording());
        dash.handle_text(&telemetry("intake", "slide", 1.0, 1));
        clock.advance(100);
        dash.handle_text(&telemetry("intake", "slide", 2.0, 2));
        assert_eq!(dash.stop_recording(), Some(0));

        dash.handle_text(&telemetry("intake", "slide", 99.0, 3));
        assert!(dash.start_replay(0));

        assert!(matches!(dash.replay_tick(), ReplayStep::Apply(_)));
        let slide = |d: &Dashboard| d.telemetry().section(SectionId::Intake).get("slide").map(|v| v.value.clone());
        assert_eq!(slide(&dash), Some(TelemetryData::Number(1.0)));
        dash.replay_tick();
        assert_eq!(slide(&dash), Some(TelemetryData::Number(2.0)));
        assert_eq!(dash.replay_tick(), ReplayStep::Finished);
        assert!(!dash.is_replaying());
        assert_eq!(slide(&dash), Some(TelemetryData::Number(2.0)), "no revert on finish");
    }

    #[test]
    fn test_replay_bypasses_pause() {
        let (mut dash, _clock) = dashboard();
        dash.start_recording();
        dash.handle_text(&telemetry("claw", "grip", 0.5, 1));
        dash.stop_recording();
        dash.reset_session();

        dash.toggle_pause();
        dash.start_replay(0);
        dash.replay_tick();
        assert_eq!(dash.telemetry().section(SectionId::Claw).len(), 1);
        assert_eq!(dash.telemetry().buffer().len(), 0);
    }

    #[test]
    fn test_resume_while_recording_captures_applied_state() {
        let (mut dash, clock) = dashboard();
        dash.start_recording();
        dash.handle_text(&telemetry("intake", "slide", 1.0, 1));

        dash.toggle_pause();
        dash.handle_text(&telemetry("intake", "slide", 2.0, 2));
        dash.handle_text(&telemetry("general", "voltage", 11.8, 3));
        dash.handle_text(&telemetry("intake", "slide", 3.0, 4));
        assert_eq!(dash.status().recorded_samples, Some(1), "buffered packets are not captured");

        clock.advance(250);
        assert!(!dash.toggle_pause());
        assert_eq!(dash.stop_recording(), Some(0));

        let last = dash.recordings()[0].data.last().unwrap();
        assert_eq!(last.timestamp, 250);
        let ids: Vec<SectionId> = last.sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SectionId::Intake, SectionId::General]);
        assert_eq!(last.sections[0].values[0].1.value, TelemetryData::Number(3.0));
        assert_eq!(last.sections[1].values[0].1.value, TelemetryData::Number(11.8));
    }

    #[test]
    fn test_resume_without_buffered_packets_captures_nothing() {
        let (mut dash, _clock) = dashboard();
        dash.start_recording();
        dash.handle_text(&telemetry("claw", "grip", 0.5, 1));
        dash.toggle_pause();
        dash.toggle_pause();
        assert_eq!(dash.status().recorded_samples, Some(1));
    }

    #[test]
    fn test_hidden_graph_stops_receiving_samples() {
        let (mut dash, _clock) = dashboard();
        dash.add_graph(GraphConfig::new("v", "Voltage", "general.voltage", 30));
        dash.handle_text(&telemetry("general", "voltage", 12.0, 1_000));

        assert!(dash.set_graph_visible("v", false));
        dash.handle_text(&telemetry("general", "voltage", 11.0, 2_000));
        assert_eq!(dash.graphs().series("v").unwrap().len(), 1);

        assert!(dash.set_graph_visible("v", true));
        dash.handle_text(&telemetry("general", "voltage", 10.5, 3_000));
        let values: Vec<f64> = dash.graphs().series("v").unwrap().samples().map(|s| s.value).collect();
        assert_eq!(values, vec![12.0, 10.5]);

        assert!(!dash.set_graph_visible("missing", false));
    }

    #[test]
    fn test_status_poll_measures_ping() {
        let (mut dash, clock) = dashboard();
        dash.set_connected(true);
        assert!(dash.queue_command(Command::GetRobotStatus));
        clock.advance(35);
        let outcome = dash.handle_text(r#"{"type":"RECEIVE_ROBOT_STATUS","status":{"opMode":"Idle"}}"#);

        assert!(matches!(outcome, RouteOutcome::PassThrough { .. }));
        assert_eq!(dash.connection().ping_ms, Some(35));
        assert!(dash.connection().robot_status.is_some());
        assert_eq!(dash.drain_commands(), vec![Command::GetRobotStatus]);
        assert!(dash.drain_commands().is_empty());
    }

    #[test]
    fn test_commands_dropped_while_disconnected() {
        let (mut dash, _clock) = dashboard();
        assert!(!dash.queue_command(Command::StartOpMode));
        dash.set_connected(true);
        assert!(dash.queue_command(Command::SetIntakeSlideTarget { payload: 30.0 }));
        dash.set_connected(false);
        assert!(dash.drain_commands().is_empty());
    }

    #[test]
    fn test_reset_session_keeps_graph_configs() {
        let (mut dash, _clock) = dashboard();
        dash.add_graph_for_key("g", "Slide", "intake.slide");
        dash.handle_text(&telemetry("intake", "slide", 5.0, 10_000));
        dash.handle_text(
            r#"{"type":"SUBSYSTEM_UPDATE","subsystem":"general","data":{"voltage":11.2},"timestamp":1}"#,
        );
        assert_eq!(dash.graphs().series("g").map(|s| s.len()), Some(1));

        dash.reset_session();
        assert_eq!(dash.graphs().len(), 1);
        assert_eq!(dash.graphs().config("g").map(|c| c.time_window_s), Some(30));
        assert_eq!(dash.graphs().series("g").map(|s| s.len()), Some(0));
        assert!(dash.graphs().rolling_series("general-voltage").is_none());
        assert_eq!(dash.subsystems().general().voltage, 12.0);
        assert!(dash.graphable_keys().is_empty());
    }

    #[test]
    fn test_status_summary() {
        let (mut dash, _clock) = dashboard();
        dash.toggle_pause();
        dash.handle_text(&telemetry("general", "a", 1.0, 1));
        dash.start_recording();

        let status = dash.status();
        assert!(status.paused);
        assert_eq!(status.paused_at, Some(10_000));
        assert_eq!(status.buffered_packets, 1);
        assert!(status.recording);
        assert_eq!(status.recorded_samples, Some(0));
        assert!(!status.replaying);
    }

    #[test]
    fn test_export_to_file_and_import() {
        let (mut dash, _clock) = dashboard();
        dash.start_recording();
        dash.handle_text(&telemetry("deposit", "lift", 3.0, 1));
        dash.stop_recording();

        let dir = TempDir::new().unwrap();
        let path = dash.export_recording_to_file(0, dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("telemetry-"));

        assert_eq!(dash.import_recording(&path).unwrap(), Some(1));
        assert_eq!(dash.recordings()[0], dash.recordings()[1]);
        assert!(matches!(
            dash.export_recording_to_file(7, dir.path()),
            Err(DashError::RecordingNotFound(7))
        ));
    }

    #[test]
    fn test_mock_clock_drives_arrival_time() {
        let mut clock = MockClock::new();
        clock.expect_now_ms().return_const(77_i64);
        let mut dash = Dashboard::new(DashboardSettings::default(), Box::new(clock));
        dash.handle_text(r#"{"type":"TELEMETRY_UPDATE","section":"general","values":[{"key":"k","value":1}]}"#);
        assert_eq!(dash.telemetry().section(SectionId::General).get("k").map(|v| v.timestamp), Some(77));
    }
}
