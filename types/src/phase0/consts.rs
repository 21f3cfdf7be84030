use core::num::NonZeroU64;

use nonzero_ext::nonzero;

use crate::phase0::primitives::{Epoch, Slot};

pub const GENESIS_EPOCH: Epoch = 0;
pub const GENESIS_SLOT: Slot = 0;
pub const SECONDS_PER_SLOT: NonZeroU64 = nonzero!(12_u64);
pub const SLOTS_PER_EPOCH: NonZeroU64 = nonzero!(32_u64);
