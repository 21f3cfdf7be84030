//! Wall-clock position on the beacon chain and the timer that drives the tracker.
//!
//! Two [`Interval`]s are merged into one [`Stream`] of [`Tick`]s:
//! - a poll interval (one slot by default), started immediately;
//! - an epoch interval aligned to epoch starts derived from the genesis time.
//!
//! Both use [`MissedTickBehavior::Skip`]. If the consumer is still busy when a tick is due,
//! the tick is delivered late once and the missed ones are dropped rather than queued.
//!
//! [`Interval`]:                  tokio::time::Interval
//! [`MissedTickBehavior::Skip`]:  tokio::time::MissedTickBehavior::Skip

use core::{error::Error, time::Duration};
use std::time::{Instant, SystemTime, SystemTimeError};

use anyhow::Result;
use futures::stream::{self, Stream, StreamExt as _};
use helper_functions::misc;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use types::{
    config::ChainConfig,
    phase0::{
        consts::GENESIS_EPOCH,
        primitives::{Epoch, Slot},
    },
};

pub trait InstantLike: Sized {
    fn checked_add(self, duration: Duration) -> Option<Self>;
}

pub trait SystemTimeLike: Copy {
    type Error: Error + Send + Sync + 'static;

    const UNIX_EPOCH: Self;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error>;
}

impl InstantLike for Instant {
    fn checked_add(self, duration: Duration) -> Option<Self> {
        Self::checked_add(&self, duration)
    }
}

impl SystemTimeLike for SystemTime {
    type Error = SystemTimeError;

    const UNIX_EPOCH: Self = Self::UNIX_EPOCH;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error> {
        Self::duration_since(&self, earlier)
    }
}

/// Position of the wall clock relative to genesis.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct WallClock {
    pub current_slot: Slot,
    pub current_epoch: Epoch,
    /// The next epoch to start. Announced to the renderer ahead of time.
    pub scheduled_epoch: Epoch,
}

impl WallClock {
    pub fn now(config: &ChainConfig) -> Result<Self> {
        Self::at_system_time(config, SystemTime::now())
    }

    pub fn at_system_time<S: SystemTimeLike>(config: &ChainConfig, now: S) -> Result<Self> {
        let unix_epoch_to_now = now.duration_since(S::UNIX_EPOCH)?;
        let slot = misc::compute_slot_at_timestamp(config, unix_epoch_to_now.as_secs());
        Ok(Self::at_slot(config, slot))
    }

    #[must_use]
    pub const fn at_slot(config: &ChainConfig, current_slot: Slot) -> Self {
        let current_epoch = misc::compute_epoch_at_slot(config, current_slot);

        Self {
            current_slot,
            current_epoch,
            scheduled_epoch: current_epoch + 1,
        }
    }

    /// Slots left until the first slot of the scheduled epoch.
    #[must_use]
    pub const fn countdown(self, config: &ChainConfig) -> u64 {
        misc::compute_start_slot_at_epoch(config, self.scheduled_epoch)
            .saturating_sub(self.current_slot)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tick {
    Poll,
    EpochStart(Epoch),
}

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum ClockError {
    #[error("time of next epoch overflowed")]
    NextInstantOverflow,
    #[error("ran out of epochs")]
    RanOutOfEpochs,
}

pub fn ticks(
    config: &ChainConfig,
    poll_interval: Duration,
) -> Result<impl Stream<Item = Result<Tick>> + Unpin + use<>> {
    // We assume the `Instant` and `SystemTime` obtained here correspond to the same point in time.
    // The error is negligible compared to the duration of a slot.
    let now_instant = Instant::now();
    let now_system_time = SystemTime::now();

    let (first_epoch, first_instant) =
        next_epoch_start_with_instant(config, now_instant, now_system_time)?;

    let epoch_duration = config.epoch_duration();
    let first_instant = tokio::time::Instant::from_std(first_instant);

    let mut poll_interval = tokio::time::interval(poll_interval);
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut epoch_interval = tokio::time::interval_at(first_instant, epoch_duration);
    epoch_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let polls = IntervalStream::new(poll_interval).map(|_| -> Result<Tick> { Ok(Tick::Poll) });

    let epochs = IntervalStream::new(epoch_interval).map(move |deadline| -> Result<Tick> {
        // `Duration` does not implement `Div<Duration>`, so we have to do arithmetic on nanoseconds.
        let elapsed = deadline.duration_since(first_instant).as_nanos();
        let epochs_elapsed = u64::try_from(elapsed / epoch_duration.as_nanos())?;
        let epoch = first_epoch
            .checked_add(epochs_elapsed)
            .ok_or(ClockError::RanOutOfEpochs)?;
        Ok(Tick::EpochStart(epoch))
    });

    Ok(stream::select(polls, epochs))
}

fn next_epoch_start_with_instant<I: InstantLike, S: SystemTimeLike>(
    config: &ChainConfig,
    now_instant: I,
    now_system_time: S,
) -> Result<(Epoch, I)> {
    let unix_epoch_to_now = now_system_time.duration_since(S::UNIX_EPOCH)?;
    let unix_epoch_to_genesis = Duration::from_secs(config.genesis_time);

    // Subtracting from `Instant`s may panic on some platforms,
    // so the time until the next epoch is computed first and added to `now_instant`.
    let (next_epoch, now_to_next_epoch) = if unix_epoch_to_now <= unix_epoch_to_genesis {
        (GENESIS_EPOCH, unix_epoch_to_genesis - unix_epoch_to_now)
    } else {
        let genesis_to_now = unix_epoch_to_now - unix_epoch_to_genesis;
        let epoch_seconds = config.epoch_duration().as_secs();
        let epochs_since_genesis = genesis_to_now.as_secs() / epoch_seconds;

        let next_epoch = GENESIS_EPOCH + epochs_since_genesis + 1;
        let genesis_to_next_epoch = Duration::from_secs(
            (epochs_since_genesis + 1)
                .checked_mul(epoch_seconds)
                .ok_or(ClockError::RanOutOfEpochs)?,
        );

        (next_epoch, genesis_to_next_epoch - genesis_to_now)
    };

    let next_instant = now_instant
        .checked_add(now_to_next_epoch)
        .ok_or(ClockError::NextInstantOverflow)?;

    Ok((next_epoch, next_instant))
}
