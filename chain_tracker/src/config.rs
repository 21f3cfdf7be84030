use core::{num::NonZeroU32, time::Duration};

use nonzero_ext::nonzero;
use types::config::ChainConfig;

pub const DEFAULT_LOOKBACK_EPOCHS: u64 = 4;
pub const DEFAULT_INITIAL_SYNC_ATTEMPTS: NonZeroU32 = nonzero!(8_u32);
pub const DEFAULT_INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    /// Number of epochs before the head epoch to backfill during the initial sync.
    pub lookback_epochs: u64,
    pub initial_sync_attempts: NonZeroU32,
    pub initial_retry_delay: Duration,
    pub max_retry_delay: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::for_chain(&ChainConfig::mainnet())
    }
}

impl TrackerConfig {
    /// Polls once per slot and caps retry delays at one slot.
    #[must_use]
    pub const fn for_chain(chain_config: &ChainConfig) -> Self {
        let slot_duration = chain_config.slot_duration();

        Self {
            poll_interval: slot_duration,
            lookback_epochs: DEFAULT_LOOKBACK_EPOCHS,
            initial_sync_attempts: DEFAULT_INITIAL_SYNC_ATTEMPTS,
            initial_retry_delay: DEFAULT_INITIAL_RETRY_DELAY,
            max_retry_delay: slot_duration,
        }
    }

    /// Delay before retry number `retry` (starting from 0).
    #[must_use]
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let factor = 2_u32.saturating_pow(retry);

        self.initial_retry_delay
            .saturating_mul(factor)
            .min(self.max_retry_delay)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(0 => Duration::from_secs(1))]
    #[test_case(1 => Duration::from_secs(2))]
    #[test_case(2 => Duration::from_secs(4))]
    #[test_case(3 => Duration::from_secs(8))]
    #[test_case(4 => Duration::from_secs(12); "capped at one slot")]
    #[test_case(40 => Duration::from_secs(12); "no overflow")]
    fn retry_delay_doubles_up_to_slot_duration(retry: u32) -> Duration {
        TrackerConfig::default().retry_delay(retry)
    }
}
