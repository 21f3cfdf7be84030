use chrono::{DateTime, Utc};
use derive_more::From;
use serde::Serialize;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{AsRefStr, Display, EnumString};

use crate::phase0::{
    containers::Participation,
    primitives::{Epoch, Root, Slot},
};

/// Whether a block exists at a slot.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    AsRefStr,
    Display,
    EnumString,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SlotStatus {
    Proposed,
    Missing,
    // Never produced by the tracker. Reserved for sources that report forks.
    Orphaned,
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    AsRefStr,
    Display,
    EnumString,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SlotFinality {
    // The order of variants affects the derived `PartialOrd` and `Ord` impls.
    Finalized,
    Justified,
    Proposed,
}

#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
    AsRefStr,
    Display,
    EnumString,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EpochFinality {
    Finalized,
    Justified,
    Pending,
}

/// `Observed` epochs have been reached by the head.
/// `Scheduled` epochs are announced ahead of time from the wall clock.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    AsRefStr,
    Display,
    EnumString,
    DeserializeFromStr,
    SerializeDisplay,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EpochRecordKind {
    Observed,
    Scheduled,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct SlotRecord {
    pub slot: Slot,
    /// Always `slot / SLOTS_PER_EPOCH` for the chain the record was built for.
    pub epoch: Epoch,
    pub status: SlotStatus,
    pub finality: SlotFinality,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_root: Option<Root>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_root: Option<Root>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_slot: Option<Slot>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct EpochRecord {
    pub epoch: Epoch,
    pub label: String,
    pub kind: EpochRecordKind,
    pub finality: EpochFinality,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participation: Option<Participation>,
}

#[derive(Clone, PartialEq, Debug, From, Serialize)]
#[serde(tag = "category")]
pub enum TimelineRecord {
    #[serde(rename = "Blocks")]
    Slot(SlotRecord),
    #[serde(rename = "Epochs")]
    Epoch(EpochRecord),
}

impl TimelineRecord {
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        match self {
            Self::Slot(record) => record.epoch,
            Self::Epoch(record) => record.epoch,
        }
    }

    #[must_use]
    pub const fn as_slot_record(&self) -> Option<&SlotRecord> {
        match self {
            Self::Slot(record) => Some(record),
            Self::Epoch(_) => None,
        }
    }

    #[must_use]
    pub const fn as_epoch_record(&self) -> Option<&EpochRecord> {
        match self {
            Self::Slot(_) => None,
            Self::Epoch(record) => Some(record),
        }
    }
}
