use thiserror::Error;
use types::phase0::{containers::SnapshotError, primitives::Slot};

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum TrackerError {
    #[error("inconsistent chain head: {0}")]
    InvariantViolation(#[from] InvariantViolation),
    #[error("beacon node unavailable after {attempts} attempts to resolve the head block")]
    SourceUnavailable { attempts: u32 },
    #[error("tracker was cancelled")]
    Cancelled,
}

#[derive(Clone, Copy, Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum InvariantViolation {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("head regressed from slot {previous} to slot {current}")]
    HeadRegressed { previous: Slot, current: Slot },
}

impl From<SnapshotError> for TrackerError {
    fn from(error: SnapshotError) -> Self {
        Self::InvariantViolation(error.into())
    }
}
