//! # Pause Buffer
//!
//! Bounded FIFO of telemetry packets that arrived while the display was
//! paused. At capacity the oldest packet is dropped to make room.

use std::collections::VecDeque;

use super::types::TelemetryPacket;

/// Default pause buffer capacity (packets)
pub const DEFAULT_PAUSE_BUFFER_SIZE: usize = 1000;

/// Bounded FIFO of held-back packets.
#[derive(Debug, Clone)]
pub struct PauseBuffer {
    packets: VecDeque<TelemetryPacket>,
    capacity: usize,
    dropped: u64,
}

impl Default for PauseBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PAUSE_BUFFER_SIZE)
    }
}

impl PauseBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            packets: VecDeque::with_capacity(capacity.min(DEFAULT_PAUSE_BUFFER_SIZE)),
            capacity,
            dropped: 0,
        }
    }

    /// Append a packet, evicting the oldest first if the buffer is full.
    ///
    /// # Returns
    ///
    /// * `Option<TelemetryPacket>` - The evicted packet, if any
    pub fn push(&mut self, packet: TelemetryPacket) -> Option<TelemetryPacket> {
        let evicted = if self.packets.len() >= self.capacity {
            self.dropped += 1;
            self.packets.pop_front()
        } else {
            None
        };
        self.packets.push_back(packet);
        evicted
    }

    /// Remove and return all packets in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = TelemetryPacket> + '_ {
        self.packets.drain(..)
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Packets evicted due to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Buffered packets, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TelemetryPacket> {
        self.packets.iter()
    }
}
