//! # Subsystem State Store
//!
//! Owns one snapshot per subsystem and merges partial updates into them in
//! place. Drivetrain position updates also extend a bounded position trail.

use tracing::debug;

use super::types::*;
use super::update::SubsystemUpdate;

/// Default number of drivetrain positions kept in the trail
pub const DEFAULT_POSITION_HISTORY_CAP: usize = 100;

/// Per-subsystem snapshot store.
#[derive(Debug, Clone)]
pub struct SubsystemStore {
    drivetrain: DrivetrainSnapshot,
    intake: IntakeSnapshot,
    deposit: DepositSnapshot,
    camera: CameraSnapshot,
    general: GeneralSnapshot,
    history_cap: usize,
}

impl Default for SubsystemStore {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION_HISTORY_CAP)
    }
}

impl SubsystemStore {
    /// Create a store with all subsystems at their declared defaults.
    ///
    /// # Arguments
    ///
    /// * `history_cap` - Maximum drivetrain position trail length (at least 1)
    pub fn new(history_cap: usize) -> Self {
        Self {
            drivetrain: DrivetrainSnapshot::default(),
            intake: IntakeSnapshot::default(),
            deposit: DepositSnapshot::default(),
            camera: CameraSnapshot::default(),
            general: GeneralSnapshot::default(),
            history_cap: history_cap.max(1),
        }
    }

    /// Merge a partial update into the targeted snapshot.
    ///
    /// Only fields present in the update change. When the update carries a
    /// drivetrain position, `{position, now}` is appended to the position
    /// trail and the oldest entry is evicted once the cap is reached.
    ///
    /// # Arguments
    ///
    /// * `update` - Typed partial update
    /// * `now` - Arrival time in epoch milliseconds, used for the trail entry
    pub fn merge_update(&mut self, update: SubsystemUpdate, now: i64) {
        match update {
            SubsystemUpdate::Drivetrain(u) => {
                let new_position = u.position;
                u.apply_to(&mut self.drivetrain);
                if let Some(position) = new_position {
                    self.push_position(position, now);
                }
            }
            SubsystemUpdate::Intake(u) => u.apply_to(&mut self.intake),
            SubsystemUpdate::Deposit(u) => u.apply_to(&mut self.deposit),
            SubsystemUpdate::Camera(u) => u.apply_to(&mut self.camera),
            SubsystemUpdate::General(u) => u.apply_to(&mut self.general),
        }
    }

    fn push_position(&mut self, position: Vector3, now: i64) {
        let history = &mut self.drivetrain.position_history;
        while history.len() >= self.history_cap {
            history.pop_front();
        }
        history.push_back(PositionHistoryEntry { position, timestamp: now });
    }

    /// Restore a subsystem to its declared defaults.
    ///
    /// Resetting the drivetrain also clears its position trail.
    pub fn reset(&mut self, subsystem: SubsystemId) {
        debug!("Resetting {} snapshot", subsystem);
        match subsystem {
            SubsystemId::Drivetrain => self.drivetrain = DrivetrainSnapshot::default(),
            SubsystemId::Intake => self.intake = IntakeSnapshot::default(),
            SubsystemId::Deposit => self.deposit = DepositSnapshot::default(),
            SubsystemId::Camera => self.camera = CameraSnapshot::default(),
            SubsystemId::General => self.general = GeneralSnapshot::default(),
        }
    }

    /// Reset every subsystem.
    pub fn reset_all(&mut self) {
        for id in SubsystemId::ALL {
            self.reset(id);
        }
    }

    pub fn drivetrain(&self) -> &DrivetrainSnapshot {
        &self.drivetrain
    }

    pub fn intake(&self) -> &IntakeSnapshot {
        &self.intake
    }

    pub fn deposit(&self) -> &DepositSnapshot {
        &self.deposit
    }

    pub fn camera(&self) -> &CameraSnapshot {
        &self.camera
    }

    pub fn general(&self) -> &GeneralSnapshot {
        &self.general
    }

    /// Drivetrain position trail, oldest first
    pub fn position_history(&self) -> impl ExactSizeIterator<Item = &PositionHistoryEntry> {
        self.drivetrain.position_history.iter()
    }

    /// Configured trail capacity
    pub fn history_cap(&self) -> usize {
        self.history_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystem::update::*;
    use proptest::prelude::*;

    fn position_update(x: f64) -> SubsystemUpdate {
        SubsystemUpdate::Drivetrain(DrivetrainUpdate {
            position: Some(Vector3::new(x, 0.0, 0.0)),
            ..Default::default()
        })
    }

    #[test]
    fn test_merge_is_field_local() {
        let mut store = SubsystemStore::default();
        store.merge_update(
            SubsystemUpdate::Intake(IntakeUpdate {
                slide_position: Some(30.0),
                slide_target: Some(50.0),
                ..Default::default()
            }),
            0,
        );
        store.merge_update(
            SubsystemUpdate::Intake(IntakeUpdate { slide_target: Some(80.0), ..Default::default() }),
            1,
        );

        let intake = store.intake();
        assert_eq!(intake.slide_position, 30.0, "untouched field keeps prior value");
        assert_eq!(intake.slide_target, 80.0, "last write wins");
        assert_eq!(intake.slide_max, 100.0);
        assert_eq!(intake.state, IntakeState::Idle);
    }

    #[test]
    fn test_update_does_not_touch_other_subsystems() {
        let mut store = SubsystemStore::default();
        store.merge_update(
            SubsystemUpdate::General(GeneralUpdate { voltage: Some(11.2), ..Default::default() }),
            0,
        );
        assert_eq!(store.general().voltage, 11.2);
        assert_eq!(store.drivetrain(), &DrivetrainSnapshot::default());
        assert_eq!(store.deposit(), &DepositSnapshot::default());
    }

    #[test]
    fn test_position_update_appends_history() {
        let mut store = SubsystemStore::default();
        store.merge_update(position_update(1.0), 1_000);
        store.merge_update(position_update(2.0), 1_050);

        let history: Vec<_> = store.position_history().cloned().collect();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].position.x, 1.0);
        assert_eq!(history[0].timestamp, 1_000);
        assert_eq!(history[1].timestamp, 1_050);
        assert_eq!(store.drivetrain().position.x, 2.0);
    }

    #[test]
    fn test_non_position_update_leaves_history_alone() {
        let mut store = SubsystemStore::default();
        store.merge_update(position_update(1.0), 0);
        store.merge_update(
            SubsystemUpdate::Drivetrain(DrivetrainUpdate { heading: Some(0.5), ..Default::default() }),
            10,
        );
        assert_eq!(store.position_history().len(), 1);
    }

    #[test]
    fn test_history_keeps_most_recent_cap_entries() {
        let mut store = SubsystemStore::default();
        for i in 0..(DEFAULT_POSITION_HISTORY_CAP + 25) {
            store.merge_update(position_update(i as f64), i as i64);
        }
        let history: Vec<_> = store.position_history().collect();
        assert_eq!(history.len(), DEFAULT_POSITION_HISTORY_CAP);
        assert_eq!(history.first().unwrap().position.x, 25.0);
        assert_eq!(history.last().unwrap().position.x, 124.0);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut store = SubsystemStore::default();
        store.merge_update(position_update(5.0), 0);
        store.merge_update(
            SubsystemUpdate::Deposit(DepositUpdate {
                state: Some(DepositState::Depositing),
                is_deposited: Some(true),
                ..Default::default()
            }),
            0,
        );

        store.reset(SubsystemId::Drivetrain);
        assert_eq!(store.drivetrain(), &DrivetrainSnapshot::default());
        assert_eq!(store.position_history().len(), 0);
        assert_eq!(store.deposit().state, DepositState::Depositing, "only the named subsystem resets");

        store.reset_all();
        assert_eq!(store.deposit(), &DepositSnapshot::default());
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let mut store = SubsystemStore::new(0);
        store.merge_update(position_update(1.0), 0);
        store.merge_update(position_update(2.0), 1);
        assert_eq!(store.history_cap(), 1);
        assert_eq!(store.position_history().next().unwrap().position.x, 2.0);
    }

    proptest! {
        #[test]
        fn prop_each_field_equals_last_write(
            updates in proptest::collection::vec(
                (proptest::option::of(-100.0..100.0f64), proptest::option::of(-100.0..100.0f64), proptest::option::of(any::<bool>())),
                0..40,
            )
        ) {
            let mut store = SubsystemStore::default();
            let mut expected = IntakeSnapshot::default();
            for (i, (position, target, has_sample)) in updates.into_iter().enumerate() {
                if let Some(v) = position { expected.slide_position = v; }
                if let Some(v) = target { expected.slide_target = v; }
                if let Some(v) = has_sample { expected.has_sample = v; }
                store.merge_update(
                    SubsystemUpdate::Intake(IntakeUpdate {
                        slide_position: position,
                        slide_target: target,
                        has_sample,
                        ..Default::default()
                    }),
                    i as i64,
                );
            }
            prop_assert_eq!(store.intake(), &expected);
        }

        #[test]
        fn prop_history_never_exceeds_cap(cap in 1usize..20, inserts in 0usize..60) {
            let mut store = SubsystemStore::new(cap);
            for i in 0..inserts {
                store.merge_update(position_update(i as f64), i as i64);
            }
            let history: Vec<_> = store.position_history().collect();
            prop_assert_eq!(history.len(), inserts.min(cap));
            // Oldest first, and exactly the most recent entries
            for (offset, entry) in history.iter().enumerate() {
                let expected = (inserts - history.len() + offset) as f64;
                prop_assert_eq!(entry.position.x, expected);
            }
        }
    }
}
