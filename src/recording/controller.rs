//! # Recording/Replay Controller
//!
//! Captures section snapshots while recording and steps through a stored
//! recording one sample per replay tick.
//!
//! Recording and replay are mutually exclusive: a request to start one while
//! the other is active is ignored. The controller owns no timer; the host
//! calls [`RecordingController::replay_tick`] every [`tick`](RecordingController::tick)
//! while [`is_replaying`](RecordingController::is_replaying) is true.
//! Samples are replayed at the fixed tick regardless of their recorded
//! spacing.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::session::{RecordedSample, Recording};
use crate::error::{DashError, Result};
use crate::telemetry::SectionSnapshot;

/// Default replay tick
pub const DEFAULT_REPLAY_TICK: Duration = Duration::from_millis(100);

/// Progress through a recording being replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayCursor {
    /// Index into the completed recordings list
    pub recording: usize,
    /// Next sample to apply
    pub position: usize,
}

/// Outcome of one replay tick
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    /// Apply this sample to the display
    Apply(RecordedSample),
    /// The recording is exhausted; replay has stopped
    Finished,
    /// No replay in progress
    Idle,
}

/// Recording session and replay state.
#[derive(Debug, Clone)]
pub struct RecordingController {
    active: Option<Recording>,
    recordings: Vec<Recording>,
    replay: Option<ReplayCursor>,
    tick: Duration,
}

impl Default for RecordingController {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_TICK)
    }
}

impl RecordingController {
    pub fn new(tick: Duration) -> Self {
        Self {
            active: None,
            recordings: Vec::new(),
            replay: None,
            tick,
        }
    }

    /// Begin a recording session at `now`.
    ///
    /// # Returns
    ///
    /// * `bool` - false if a recording or replay is already active
    pub fn start_recording(&mut self, now: i64) -> bool {
        if self.active.is_some() {
            debug!("Recording already active, ignoring start");
            return false;
        }
        if self.replay.is_some() {
            warn!("Cannot start recording while replaying");
            return false;
        }
        self.active = Some(Recording::new(now));
        info!("Recording started");
        true
    }

    /// Append a frame to the active recording. No-op when not recording.
    ///
    /// # Arguments
    ///
    /// * `now` - Capture time (epoch ms); stored relative to the session start
    /// * `sections` - Snapshots of the sections that changed
    pub fn capture(&mut self, now: i64, sections: Vec<SectionSnapshot>) {
        if let Some(recording) = self.active.as_mut() {
            recording.data.push(RecordedSample {
                timestamp: now - recording.start_time,
                sections,
            });
        }
    }

    /// End the recording session.
    ///
    /// A session with at least one sample is kept; an empty one is discarded.
    ///
    /// # Returns
    ///
    /// * `Option<usize>` - Index of the stored recording
    pub fn stop_recording(&mut self) -> Option<usize> {
        let recording = self.active.take()?;
        if recording.is_empty() {
            info!("Recording stopped with no samples, discarded");
            return None;
        }
        info!("Recording stopped ({} samples, {} ms)", recording.len(), recording.duration_ms());
        self.recordings.push(recording);
        Some(self.recordings.len() - 1)
    }

    /// Append a previously exported recording to the completed list.
    ///
    /// # Returns
    ///
    /// * `Option<usize>` - Index of the stored recording, `None` if it has no samples
    pub fn import(&mut self, recording: Recording) -> Option<usize> {
        if recording.is_empty() {
            warn!("Ignoring imported recording with no samples");
            return None;
        }
        info!("Imported recording ({} samples)", recording.len());
        self.recordings.push(recording);
        Some(self.recordings.len() - 1)
    }

    /// Begin replaying the recording at `index`.
    ///
    /// # Returns
    ///
    /// * `bool` - false if the index is invalid, a recording is active, or a
    ///   replay is already running
    pub fn start_replay(&mut self, index: usize) -> bool {
        if self.active.is_some() {
            warn!("Cannot start replay while recording");
            return false;
        }
        if self.replay.is_some() {
            debug!("Replay already running, ignoring start");
            return false;
        }
        if index >= self.recordings.len() {
            warn!("No recording at index {} ({} available)", index, self.recordings.len());
            return false;
        }
        self.replay = Some(ReplayCursor { recording: index, position: 0 });
        info!("Replay of recording {} started", index);
        true
    }

    /// Advance replay by one sample.
    ///
    /// The tick after the last sample stops the replay and reports
    /// [`ReplayStep::Finished`].
    pub fn replay_tick(&mut self) -> ReplayStep {
        let Some(cursor) = self.replay.as_mut() else {
            return ReplayStep::Idle;
        };
        match self.recordings[cursor.recording].data.get(cursor.position) {
            Some(sample) => {
                cursor.position += 1;
                ReplayStep::Apply(sample.clone())
            }
            None => {
                info!("Replay of recording {} finished", cursor.recording);
                self.replay = None;
                ReplayStep::Finished
            }
        }
    }

    /// Cancel the running replay. Already-applied samples stay applied.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether a replay was running
    pub fn stop_replay(&mut self) -> bool {
        let was_running = self.replay.take().is_some();
        if was_running {
            info!("Replay stopped");
        }
        was_running
    }

    /// Serialize a completed recording to its export form.
    ///
    /// # Errors
    ///
    /// Returns `RecordingNotFound` for an invalid index
    pub fn export(&self, index: usize) -> Result<String> {
        self.recordings
            .get(index)
            .ok_or(DashError::RecordingNotFound(index))?
            .to_json()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_some()
    }

    pub fn replay_cursor(&self) -> Option<ReplayCursor> {
        self.replay
    }

    /// Samples captured so far in the active session
    pub fn active_len(&self) -> Option<usize> {
        self.active.as_ref().map(Recording::len)
    }

    /// Completed recordings, oldest first
    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    /// Replay tick period
    pub fn tick(&self) -> Duration {
        self.tick
    }
}
