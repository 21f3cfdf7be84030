use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::phase0::primitives::{Epoch, Gwei, Root, Slot};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum SnapshotError {
    #[error("finalized slot {finalized} is after justified slot {justified}")]
    FinalizedAfterJustified { finalized: Slot, justified: Slot },
    #[error("justified slot {justified} is after head slot {head}")]
    JustifiedAfterHead { justified: Slot, head: Slot },
    #[error("finalized epoch {finalized} is after justified epoch {justified}")]
    FinalizedEpochAfterJustified { finalized: Epoch, justified: Epoch },
    #[error("justified epoch {justified} is after head epoch {head}")]
    JustifiedEpochAfterHead { justified: Epoch, head: Epoch },
}

/// Result of one chain head query.
#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
pub struct ChainHeadSnapshot {
    pub head_slot: Slot,
    pub head_epoch: Epoch,
    pub head_block_root: Option<Root>,
    pub justified_slot: Slot,
    pub justified_epoch: Epoch,
    pub finalized_slot: Slot,
    pub finalized_epoch: Epoch,
}

impl ChainHeadSnapshot {
    /// Checks `finalized <= justified <= head` for both slots and epochs.
    pub const fn validate(&self) -> Result<(), SnapshotError> {
        if self.finalized_slot > self.justified_slot {
            return Err(SnapshotError::FinalizedAfterJustified {
                finalized: self.finalized_slot,
                justified: self.justified_slot,
            });
        }

        if self.justified_slot > self.head_slot {
            return Err(SnapshotError::JustifiedAfterHead {
                justified: self.justified_slot,
                head: self.head_slot,
            });
        }

        if self.finalized_epoch > self.justified_epoch {
            return Err(SnapshotError::FinalizedEpochAfterJustified {
                finalized: self.finalized_epoch,
                justified: self.justified_epoch,
            });
        }

        if self.justified_epoch > self.head_epoch {
            return Err(SnapshotError::JustifiedEpochAfterHead {
                justified: self.justified_epoch,
                head: self.head_epoch,
            });
        }

        Ok(())
    }

    #[must_use]
    pub const fn thresholds(&self) -> FinalityThresholds {
        FinalityThresholds {
            justified_slot: self.justified_slot,
            justified_epoch: self.justified_epoch,
            finalized_slot: self.finalized_slot,
            finalized_epoch: self.finalized_epoch,
        }
    }
}

/// The parts of a [`ChainHeadSnapshot`] that classification depends on.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FinalityThresholds {
    pub justified_slot: Slot,
    pub justified_epoch: Epoch,
    pub finalized_slot: Slot,
    pub finalized_epoch: Epoch,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct SlotBlock {
    pub slot: Slot,
    pub block_root: Root,
    pub parent_root: Root,
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct Participation {
    pub global_participation_rate: f64,
    pub voted_ether: Gwei,
    pub eligible_ether: Gwei,
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn snapshot(head: Slot, justified: Slot, finalized: Slot) -> ChainHeadSnapshot {
        ChainHeadSnapshot {
            head_slot: head,
            head_epoch: head / 32,
            justified_slot: justified,
            justified_epoch: justified / 32,
            finalized_slot: finalized,
            finalized_epoch: finalized / 32,
            ..ChainHeadSnapshot::default()
        }
    }

    #[test_case(100, 64, 32 => Ok(()); "ordered")]
    #[test_case(64, 64, 64 => Ok(()); "all equal")]
    #[test_case(100, 32, 64 => Err(SnapshotError::FinalizedAfterJustified { finalized: 64, justified: 32 }))]
    #[test_case(60, 64, 32 => Err(SnapshotError::JustifiedAfterHead { justified: 64, head: 60 }))]
    fn validate(head: Slot, justified: Slot, finalized: Slot) -> Result<(), SnapshotError> {
        snapshot(head, justified, finalized).validate()
    }

    #[test]
    fn epoch_ordering_is_checked_independently_of_slots() {
        let snapshot = ChainHeadSnapshot {
            head_epoch: 2,
            justified_epoch: 3,
            ..snapshot(100, 64, 32)
        };

        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::JustifiedEpochAfterHead {
                justified: 3,
                head: 2,
            }),
        );
    }
}
