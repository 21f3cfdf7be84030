use core::fmt::{Display, Formatter, Result as FmtResult};

use clock::WallClock;
use helper_functions::classification::{self, Checkpoint, Lag};
use types::{
    config::ChainConfig,
    phase0::{
        containers::ChainHeadSnapshot,
        primitives::{Epoch, Slot},
    },
};

/// Where the chain stands relative to the wall clock.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StatusReport {
    pub current_slot: Slot,
    pub current_epoch: Epoch,
    pub scheduled_epoch: Epoch,
    /// Slots until the first slot of `scheduled_epoch`.
    pub countdown: u64,
    pub head_slot: Slot,
    pub head_epoch: Epoch,
    pub justified_slot: Slot,
    pub justified_epoch: Epoch,
    pub finalized_slot: Slot,
    pub finalized_epoch: Epoch,
    pub head_lag: Lag,
    pub justified_lag: Lag,
    pub finalized_lag: Lag,
}

impl StatusReport {
    #[must_use]
    pub const fn new(
        chain_config: &ChainConfig,
        clock: WallClock,
        snapshot: &ChainHeadSnapshot,
    ) -> Self {
        let current_epoch = clock.current_epoch;

        Self {
            current_slot: clock.current_slot,
            current_epoch,
            scheduled_epoch: clock.scheduled_epoch,
            countdown: clock.countdown(chain_config),
            head_slot: snapshot.head_slot,
            head_epoch: snapshot.head_epoch,
            justified_slot: snapshot.justified_slot,
            justified_epoch: snapshot.justified_epoch,
            finalized_slot: snapshot.finalized_slot,
            finalized_epoch: snapshot.finalized_epoch,
            head_lag: classification::describe_lag(
                Checkpoint::Head,
                current_epoch,
                snapshot.head_epoch,
            ),
            justified_lag: classification::describe_lag(
                Checkpoint::Justified,
                current_epoch,
                snapshot.justified_epoch,
            ),
            finalized_lag: classification::describe_lag(
                Checkpoint::Finalized,
                current_epoch,
                snapshot.finalized_epoch,
            ),
        }
    }
}

impl Display for StatusReport {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(
            formatter,
            "current {}/{}, head {}/{} ({}), justified {}/{} ({}), finalized {}/{} ({}), \
             epoch {} in {} slots",
            self.current_slot,
            self.current_epoch,
            self.head_slot,
            self.head_epoch,
            self.head_lag,
            self.justified_slot,
            self.justified_epoch,
            self.justified_lag,
            self.finalized_slot,
            self.finalized_epoch,
            self.finalized_lag,
            self.scheduled_epoch,
            self.countdown,
        )
    }
}
