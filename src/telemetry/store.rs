//! # Telemetry Section Store
//!
//! Holds the fixed set of telemetry sections and implements pause/resume.
//!
//! While live, section updates merge into the section maps immediately.
//! While paused, whole packets are queued in a [`PauseBuffer`] and applied
//! on resume in arrival order with the same merge rule, so resuming
//! produces exactly the state live application would have produced (as
//! long as the buffer never overflowed).

use tracing::{debug, info, warn};

use super::buffer::{PauseBuffer, DEFAULT_PAUSE_BUFFER_SIZE};
use super::types::*;

/// Result of [`TelemetryStore::update_section`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionWrite {
    /// Values merged into the section
    Applied,
    /// Display paused; packet queued. `evicted` is true if the oldest
    /// buffered packet had to be dropped.
    Buffered { evicted: bool },
}

/// Store of the five telemetry sections.
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    sections: [TelemetrySection; 5],
    paused: bool,
    paused_at: Option<i64>,
    buffer: PauseBuffer,
    graphable: Vec<String>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE_BUFFER_SIZE)
    }
}

impl TelemetryStore {
    /// Create a live (unpaused) store with empty sections.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - Pause buffer capacity in packets
    pub fn new(buffer_size: usize) -> Self {
        Self {
            sections: SectionId::ALL.map(TelemetrySection::new),
            paused: false,
            paused_at: None,
            buffer: PauseBuffer::new(buffer_size),
            graphable: Vec::new(),
        }
    }

    /// Write a packet of values to a section, or queue it while paused.
    ///
    /// # Arguments
    ///
    /// * `section` - Target section
    /// * `values` - Stamped values; later entries overwrite earlier ones with the same key
    /// * `now` - Arrival time (epoch ms), recorded on buffered packets
    pub fn update_section(&mut self, section: SectionId, values: Vec<TelemetryValue>, now: i64) -> SectionWrite {
        if self.paused {
            let evicted = self
                .buffer
                .push(TelemetryPacket { section, values, arrived_at: now })
                .is_some();
            if evicted {
                warn!(
                    "Pause buffer full ({} packets), dropped oldest packet",
                    self.buffer.capacity()
                );
            }
            return SectionWrite::Buffered { evicted };
        }

        self.merge(section, values);
        self.recompute_graphable();
        SectionWrite::Applied
    }

    fn merge(&mut self, section: SectionId, values: Vec<TelemetryValue>) {
        let target = &mut self.sections[section.index()];
        for value in values {
            target.upsert(value);
        }
    }

    /// Flip between live and paused.
    ///
    /// Pausing records `now` as the pause time. Resuming applies every
    /// buffered packet in arrival order, clears the buffer and recomputes
    /// the graphable key index.
    ///
    /// # Returns
    ///
    /// * `bool` - The new paused state
    pub fn toggle_pause(&mut self, now: i64) -> bool {
        if self.paused {
            let packets: Vec<TelemetryPacket> = self.buffer.drain().collect();
            let count = packets.len();
            for packet in packets {
                self.merge(packet.section, packet.values);
            }
            self.paused = false;
            self.paused_at = None;
            self.recompute_graphable();
            info!("Telemetry resumed, applied {} buffered packets", count);
        } else {
            self.paused = true;
            self.paused_at = Some(now);
            info!("Telemetry paused");
        }
        self.paused
    }

    /// Replace a section's values with a recorded snapshot.
    ///
    /// Used by replay; bypasses the pause gate. Repeated keys in the
    /// snapshot collapse to the last one.
    pub fn restore_section(&mut self, snapshot: &SectionSnapshot) {
        let target = &mut self.sections[snapshot.id.index()];
        target.clear();
        for (_, value) in &snapshot.values {
            target.upsert(value.clone());
        }
        self.recompute_graphable();
        debug!("Restored section {} ({} values)", snapshot.id, snapshot.values.len());
    }

    /// Sections with at least one buffered packet, in display order
    pub fn buffered_sections(&self) -> Vec<SectionId> {
        let mut ids: Vec<SectionId> = self.buffer.iter().map(|p| p.section).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Drop all values and buffered packets. Pause state and section
    /// visibility flags are kept.
    pub fn clear(&mut self) {
        for section in &mut self.sections {
            section.clear();
        }
        self.buffer.clear();
        self.graphable.clear();
    }

    fn recompute_graphable(&mut self) {
        self.graphable = self
            .sections
            .iter()
            .flat_map(|section| {
                section
                    .values()
                    .iter()
                    .filter(|v| v.value.as_number().is_some())
                    .map(move |v| format!("{}.{}", section.id(), v.key))
            })
            .collect();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// When the current pause began, if paused
    pub fn paused_at(&self) -> Option<i64> {
        self.paused_at
    }

    pub fn section(&self, id: SectionId) -> &TelemetrySection {
        &self.sections[id.index()]
    }

    pub fn sections(&self) -> &[TelemetrySection] {
        &self.sections
    }

    pub fn set_collapsed(&mut self, id: SectionId, collapsed: bool) {
        self.sections[id.index()].collapsed = collapsed;
    }

    pub fn set_visible(&mut self, id: SectionId, visible: bool) {
        self.sections[id.index()].visible = visible;
    }

    /// `section.key` paths whose current value is numeric
    pub fn graphable_keys(&self) -> &[String] {
        &self.graphable
    }

    pub fn buffer(&self) -> &PauseBuffer {
        &self.buffer
    }
}
