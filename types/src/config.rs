use core::{num::NonZeroU64, time::Duration};
use std::borrow::Cow;

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::phase0::{
    consts::{SECONDS_PER_SLOT, SLOTS_PER_EPOCH},
    primitives::UnixSeconds,
};

/// Chain parameters the timeline depends on.
///
/// Numeric fields accept both JSON numbers and decimal strings,
/// since beacon nodes and configuration files disagree on which one to use.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ChainConfig {
    pub config_name: Cow<'static, str>,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub slots_per_epoch: NonZeroU64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub seconds_per_slot: NonZeroU64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub genesis_time: UnixSeconds,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ChainConfig {
    #[must_use]
    pub const fn mainnet() -> Self {
        Self {
            config_name: Cow::Borrowed("mainnet"),
            slots_per_epoch: SLOTS_PER_EPOCH,
            seconds_per_slot: SECONDS_PER_SLOT,
            genesis_time: 1_606_824_023,
        }
    }

    #[must_use]
    pub const fn sepolia() -> Self {
        Self {
            config_name: Cow::Borrowed("sepolia"),
            genesis_time: 1_655_733_600,
            slots_per_epoch: SLOTS_PER_EPOCH,
            seconds_per_slot: SECONDS_PER_SLOT,
        }
    }

    #[must_use]
    pub const fn holesky() -> Self {
        Self {
            config_name: Cow::Borrowed("holesky"),
            genesis_time: 1_695_902_400,
            slots_per_epoch: SLOTS_PER_EPOCH,
            seconds_per_slot: SECONDS_PER_SLOT,
        }
    }

    #[must_use]
    pub const fn hoodi() -> Self {
        Self {
            config_name: Cow::Borrowed("hoodi"),
            genesis_time: 1_742_213_400,
            slots_per_epoch: SLOTS_PER_EPOCH,
            seconds_per_slot: SECONDS_PER_SLOT,
        }
    }

    /// Parameters for a network that is not predefined.
    ///
    /// The genesis time is usually unknown at this point and filled in later
    /// with [`ChainConfig::with_genesis_time`].
    #[must_use]
    pub const fn custom(slots_per_epoch: NonZeroU64, seconds_per_slot: NonZeroU64) -> Self {
        Self {
            config_name: Cow::Borrowed("custom"),
            slots_per_epoch,
            seconds_per_slot,
            genesis_time: 0,
        }
    }

    /// Small epochs for tests that cross many epoch boundaries.
    #[must_use]
    pub const fn minimal() -> Self {
        Self {
            config_name: Cow::Borrowed("minimal"),
            slots_per_epoch: nonzero!(8_u64),
            seconds_per_slot: nonzero!(6_u64),
            genesis_time: 0,
        }
    }

    #[must_use]
    pub const fn with_genesis_time(mut self, genesis_time: UnixSeconds) -> Self {
        self.genesis_time = genesis_time;
        self
    }

    #[must_use]
    pub const fn slot_duration(&self) -> Duration {
        Duration::from_secs(self.seconds_per_slot.get())
    }

    #[must_use]
    pub const fn epoch_duration(&self) -> Duration {
        Duration::from_secs(self.seconds_per_slot.get() * self.slots_per_epoch.get())
    }
}
