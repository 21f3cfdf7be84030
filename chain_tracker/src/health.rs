use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use strum::{AsRefStr, Display};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TrackerPhase {
    #[default]
    Uninitialized,
    SyncingInitial,
    SteadyPolling,
    ReconcilingGap,
    Stopped,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TrackerHealth {
    pub phase: TrackerPhase,
    pub last_successful_sync: Option<DateTime<Utc>>,
    pub consecutive_failures: u64,
    pub last_error: Option<String>,
}

/// Read side of the tracker's health. Readers never block the tracker.
#[derive(Clone, Default)]
pub struct HealthHandle(Arc<ArcSwap<TrackerHealth>>);

impl HealthHandle {
    #[must_use]
    pub fn load(&self) -> Arc<TrackerHealth> {
        self.0.load_full()
    }

    pub(crate) fn update(&self, update: impl FnOnce(&mut TrackerHealth)) {
        let mut health = TrackerHealth::clone(&self.0.load());
        update(&mut health);
        self.0.store(Arc::new(health));
    }

    pub(crate) fn set_phase(&self, phase: TrackerPhase) {
        self.update(|health| health.phase = phase);
    }

    pub(crate) fn record_success(&self) {
        self.update(|health| {
            health.last_successful_sync = Some(Utc::now());
            health.consecutive_failures = 0;
            health.last_error = None;
        });
    }

    pub(crate) fn record_failure(&self, error: &anyhow::Error) {
        self.update(|health| {
            health.consecutive_failures += 1;
            health.last_error = Some(error.to_string());
        });
    }
}
