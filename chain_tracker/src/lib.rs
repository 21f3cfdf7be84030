pub use crate::{
    config::TrackerConfig,
    error::{InvariantViolation, TrackerError},
    health::{HealthHandle, TrackerHealth, TrackerPhase},
    renderer::TimelineRenderer,
    state::TrackerState,
    status::StatusReport,
    tracker::ChainStateTracker,
};

mod config;
mod error;
mod health;
mod renderer;
mod state;
mod status;
mod tracker;

#[cfg(test)]
mod fake_source;
