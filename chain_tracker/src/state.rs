use std::collections::HashMap;

use types::phase0::{
    containers::{ChainHeadSnapshot, FinalityThresholds},
    primitives::{Epoch, Root, Slot},
};

use crate::health::TrackerPhase;

/// Everything the tracker remembers between cycles.
#[derive(Clone, Debug, Default)]
pub struct TrackerState {
    pub(crate) phase: TrackerPhase,
    pub(crate) previous_slot: Slot,
    pub(crate) previous_epoch: Epoch,
    pub(crate) snapshot: ChainHeadSnapshot,
    // May be newer than the thresholds in `snapshot` after a refresh in the middle of a walk.
    pub(crate) thresholds: FinalityThresholds,
    /// First slot of the lookback window. Emission starts here.
    pub(crate) first_slot: Slot,
    pub(crate) last_emitted_slot: Option<Slot>,
    pub(crate) last_emitted_epoch: Option<Epoch>,
    pub(crate) last_scheduled_epoch: Option<Epoch>,
    pub(crate) previous_block_root: Option<Root>,
    pub(crate) roots: RootIndex,
}

impl TrackerState {
    #[must_use]
    pub const fn phase(&self) -> TrackerPhase {
        self.phase
    }

    #[must_use]
    pub const fn previous_slot(&self) -> Slot {
        self.previous_slot
    }

    #[must_use]
    pub const fn previous_epoch(&self) -> Epoch {
        self.previous_epoch
    }

    #[must_use]
    pub const fn snapshot(&self) -> &ChainHeadSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub const fn thresholds(&self) -> FinalityThresholds {
        self.thresholds
    }

    #[must_use]
    pub const fn last_emitted_slot(&self) -> Option<Slot> {
        self.last_emitted_slot
    }

    #[must_use]
    pub const fn last_emitted_epoch(&self) -> Option<Epoch> {
        self.last_emitted_epoch
    }

    #[must_use]
    pub const fn previous_block_root(&self) -> Option<&Root> {
        self.previous_block_root.as_ref()
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        !matches!(
            self.phase,
            TrackerPhase::Uninitialized | TrackerPhase::SyncingInitial,
        )
    }

    /// Next slot the walk has to classify.
    pub(crate) fn next_slot(&self) -> Slot {
        self.last_emitted_slot
            .map_or(self.first_slot, |slot| slot + 1)
    }

    pub(crate) fn is_emitted(&self, slot: Slot) -> bool {
        self.last_emitted_slot.is_some_and(|last| slot <= last)
    }

    pub(crate) fn is_epoch_emitted(&self, epoch: Epoch) -> bool {
        self.last_emitted_epoch.is_some_and(|last| epoch <= last)
    }
}

/// Slots of emitted blocks by root. Resolves parent slots without scanning emitted records.
#[derive(Clone, Debug, Default)]
pub struct RootIndex {
    slots: HashMap<Root, Slot>,
}

impl RootIndex {
    pub fn insert(&mut self, root: Root, slot: Slot) {
        self.slots.insert(root, slot);
    }

    #[must_use]
    pub fn slot(&self, root: &Root) -> Option<Slot> {
        self.slots.get(root).copied()
    }

    pub fn prune_below(&mut self, slot: Slot) {
        self.slots.retain(|_, indexed_slot| *indexed_slot >= slot);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
