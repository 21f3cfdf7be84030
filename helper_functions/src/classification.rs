//! Finality classification of slots and epochs.
//!
//! Classification depends only on the justified and finalized checkpoints of the latest chain head.
//! Elapsed wall-clock time is never used because it drifts from consensus under network delay.

use core::fmt::{Display, Formatter, Result as FmtResult};

use strum::{AsRefStr, Display as StrumDisplay};
use types::{
    nonstandard::{EpochFinality, SlotFinality},
    phase0::{
        containers::FinalityThresholds,
        primitives::{Epoch, Slot},
    },
};

#[must_use]
pub const fn classify_slot_status(
    slot: Slot,
    finalized_slot: Slot,
    justified_slot: Slot,
) -> SlotFinality {
    if slot <= finalized_slot {
        SlotFinality::Finalized
    } else if slot <= justified_slot {
        SlotFinality::Justified
    } else {
        SlotFinality::Proposed
    }
}

#[must_use]
pub const fn classify_epoch_status(
    epoch: Epoch,
    finalized_epoch: Epoch,
    justified_epoch: Epoch,
) -> EpochFinality {
    if epoch <= finalized_epoch {
        EpochFinality::Finalized
    } else if epoch <= justified_epoch {
        EpochFinality::Justified
    } else {
        EpochFinality::Pending
    }
}

#[must_use]
pub const fn classify_slot(thresholds: FinalityThresholds, slot: Slot) -> SlotFinality {
    classify_slot_status(slot, thresholds.finalized_slot, thresholds.justified_slot)
}

#[must_use]
pub const fn classify_epoch(thresholds: FinalityThresholds, epoch: Epoch) -> EpochFinality {
    classify_epoch_status(epoch, thresholds.finalized_epoch, thresholds.justified_epoch)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, AsRefStr, StrumDisplay)]
#[strum(serialize_all = "lowercase")]
pub enum Checkpoint {
    Head,
    Justified,
    Finalized,
}

impl Checkpoint {
    /// Lag in epochs that is still considered in sync.
    ///
    /// Justification trails the head by up to 2 epochs and finalization by up to 3 in a healthy network.
    #[must_use]
    pub const fn tolerated_lag(self) -> u64 {
        match self {
            Self::Head => 1,
            Self::Justified => 2,
            Self::Finalized => 3,
        }
    }

    const fn unit(self) -> &'static str {
        match self {
            Self::Head => "epochs",
            Self::Justified | Self::Finalized => "checkpoints",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Lag {
    InSync,
    Behind { checkpoint: Checkpoint, epochs: u64 },
}

impl Display for Lag {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        match self {
            Self::InSync => formatter.write_str("in sync"),
            Self::Behind { checkpoint, epochs } => {
                write!(formatter, "{epochs} {} behind", checkpoint.unit())
            }
        }
    }
}

/// Describes how far `checkpoint_epoch` trails the wall-clock epoch.
#[must_use]
pub const fn describe_lag(checkpoint: Checkpoint, current_epoch: Epoch, checkpoint_epoch: Epoch) -> Lag {
    let epochs = current_epoch.saturating_sub(checkpoint_epoch);

    if epochs > checkpoint.tolerated_lag() {
        Lag::Behind { checkpoint, epochs }
    } else {
        Lag::InSync
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(64, 64, 96 => SlotFinality::Finalized; "at finalized slot")]
    #[test_case(65, 64, 65 => SlotFinality::Justified; "just after finalized slot")]
    #[test_case(97, 64, 96 => SlotFinality::Proposed; "just after justified slot")]
    #[test_case(0, 0, 0 => SlotFinality::Finalized; "genesis")]
    #[test_case(96, 64, 96 => SlotFinality::Justified; "at justified slot")]
    fn slot_status(slot: Slot, finalized_slot: Slot, justified_slot: Slot) -> SlotFinality {
        classify_slot_status(slot, finalized_slot, justified_slot)
    }

    #[test_case(2, 2, 3 => EpochFinality::Finalized)]
    #[test_case(3, 2, 3 => EpochFinality::Justified)]
    #[test_case(4, 2, 3 => EpochFinality::Pending)]
    #[test_case(1, 2, 3 => EpochFinality::Finalized)]
    fn epoch_status(epoch: Epoch, finalized_epoch: Epoch, justified_epoch: Epoch) -> EpochFinality {
        classify_epoch_status(epoch, finalized_epoch, justified_epoch)
    }

    #[test]
    fn boundaries_hold_for_arbitrary_thresholds() {
        for finalized_slot in [0, 1, 31, 32, 1000] {
            for justified_slot in [finalized_slot, finalized_slot + 1, finalized_slot + 64] {
                assert_eq!(
                    classify_slot_status(finalized_slot, finalized_slot, justified_slot),
                    SlotFinality::Finalized,
                );
                assert_eq!(
                    classify_slot_status(justified_slot + 1, finalized_slot, justified_slot),
                    SlotFinality::Proposed,
                );
            }

            assert_eq!(
                classify_slot_status(finalized_slot + 1, finalized_slot, finalized_slot + 1),
                SlotFinality::Justified,
            );
        }
    }

    #[test_case(Checkpoint::Head, 10, 10 => "in sync")]
    #[test_case(Checkpoint::Head, 10, 9 => "in sync")]
    #[test_case(Checkpoint::Head, 10, 8 => "2 epochs behind")]
    #[test_case(Checkpoint::Justified, 10, 8 => "in sync")]
    #[test_case(Checkpoint::Justified, 10, 7 => "3 checkpoints behind")]
    #[test_case(Checkpoint::Finalized, 10, 7 => "in sync")]
    #[test_case(Checkpoint::Finalized, 10, 5 => "5 checkpoints behind")]
    #[test_case(Checkpoint::Finalized, 3, 7 => "in sync"; "checkpoint ahead of clock")]
    fn lag_description(checkpoint: Checkpoint, current_epoch: Epoch, checkpoint_epoch: Epoch) -> String {
        describe_lag(checkpoint, current_epoch, checkpoint_epoch).to_string()
    }
}
