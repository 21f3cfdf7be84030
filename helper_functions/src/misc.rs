use chrono::{DateTime, Utc};
use types::{
    config::ChainConfig,
    phase0::{
        consts::GENESIS_SLOT,
        primitives::{Epoch, Slot, UnixSeconds},
    },
};

#[must_use]
pub const fn compute_epoch_at_slot(config: &ChainConfig, slot: Slot) -> Epoch {
    slot / config.slots_per_epoch.get()
}

#[must_use]
pub const fn compute_start_slot_at_epoch(config: &ChainConfig, epoch: Epoch) -> Slot {
    epoch.saturating_mul(config.slots_per_epoch.get())
}

#[must_use]
pub const fn slots_since_epoch_start(config: &ChainConfig, slot: Slot) -> u64 {
    slot % config.slots_per_epoch.get()
}

#[must_use]
pub const fn is_epoch_start(config: &ChainConfig, slot: Slot) -> bool {
    slots_since_epoch_start(config, slot) == 0
}

#[must_use]
pub const fn compute_timestamp_at_slot(config: &ChainConfig, slot: Slot) -> UnixSeconds {
    let slots_since_genesis = slot - GENESIS_SLOT;
    config
        .genesis_time
        .saturating_add(slots_since_genesis.saturating_mul(config.seconds_per_slot.get()))
}

#[must_use]
pub const fn compute_timestamp_at_epoch(config: &ChainConfig, epoch: Epoch) -> UnixSeconds {
    compute_timestamp_at_slot(config, compute_start_slot_at_epoch(config, epoch))
}

/// Slot in progress at `time`. Times before genesis map to the genesis slot.
#[must_use]
pub const fn compute_slot_at_timestamp(config: &ChainConfig, time: UnixSeconds) -> Slot {
    match time.checked_sub(config.genesis_time) {
        Some(since_genesis) => GENESIS_SLOT + since_genesis / config.seconds_per_slot.get(),
        None => GENESIS_SLOT,
    }
}

#[must_use]
pub fn time_at_slot(config: &ChainConfig, slot: Slot) -> DateTime<Utc> {
    to_date_time(compute_timestamp_at_slot(config, slot))
}

#[must_use]
pub fn time_at_epoch(config: &ChainConfig, epoch: Epoch) -> DateTime<Utc> {
    to_date_time(compute_timestamp_at_epoch(config, epoch))
}

fn to_date_time(timestamp: UnixSeconds) -> DateTime<Utc> {
    i64::try_from(timestamp)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
