use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Mutex,
};

use beacon_api::{ChainDataSource, DataSourceError};
use types::{
    nonstandard::{EpochRecord, SlotRecord, TimelineRecord},
    phase0::{
        consts::SLOTS_PER_EPOCH,
        containers::{ChainHeadSnapshot, Participation, SlotBlock},
        primitives::{Epoch, Root, Slot, UnixSeconds},
    },
};

use crate::renderer::TimelineRenderer;

/// Chain data source that replays a script and records every call made to it.
#[derive(Default)]
pub struct FakeSource {
    script: Mutex<Script>,
}

#[derive(Default)]
struct Script {
    // The last snapshot is repeated once the others have been consumed.
    heads: VecDeque<ChainHeadSnapshot>,
    failing_chain_head_calls: HashSet<usize>,
    blocks: HashMap<Slot, SlotBlock>,
    hidden_slots: HashMap<Slot, usize>,
    failing_slots: HashSet<Slot>,
    batch_epochs: HashSet<Epoch>,
    failing_batch_epochs: HashSet<Epoch>,
    slots_missing_from_batches: HashSet<Slot>,
    participation: HashMap<Epoch, Participation>,
    failing_participation: HashSet<Epoch>,
    calls: Calls,
}

#[derive(Clone, Default, Debug)]
pub struct Calls {
    pub chain_head: usize,
    pub block_at_slot: Vec<Slot>,
    pub blocks_by_epoch: Vec<Epoch>,
    pub participation: Vec<Epoch>,
}

impl FakeSource {
    pub fn with_head(head_slot: Slot) -> Self {
        let source = Self::default();
        source.push_head(snapshot(head_slot));
        source
    }

    pub fn push_head(&self, snapshot: ChainHeadSnapshot) {
        self.script().heads.push_back(snapshot);
    }

    /// Makes chain head request number `call` (starting from 1) fail.
    pub fn fail_chain_head_call(&self, call: usize) {
        self.script().failing_chain_head_calls.insert(call);
    }

    /// Adds blocks at `slots`, each one the child of the previous one.
    pub fn add_chain(&self, slots: &[Slot]) {
        let mut script = self.script();

        for (index, slot) in slots.iter().copied().enumerate() {
            let parent_slot = index
                .checked_sub(1)
                .and_then(|parent_index| slots.get(parent_index))
                .copied()
                .unwrap_or_else(|| slot.saturating_sub(1));

            script.blocks.insert(slot, block(slot, parent_slot));
        }
    }

    pub fn add_block(&self, block: SlotBlock) {
        self.script().blocks.insert(block.slot, block);
    }

    /// Makes the block at `slot` appear absent for the next `times` requests.
    pub fn hide_slot(&self, slot: Slot, times: usize) {
        self.script().hidden_slots.insert(slot, times);
    }

    pub fn fail_slot_once(&self, slot: Slot) {
        self.script().failing_slots.insert(slot);
    }

    pub fn serve_epoch_batch(&self, epoch: Epoch) {
        self.script().batch_epochs.insert(epoch);
    }

    /// Makes the batch for `epoch` fail as if the node sent an unexpected body.
    pub fn fail_epoch_batch(&self, epoch: Epoch) {
        self.script().failing_batch_epochs.insert(epoch);
    }

    /// Leaves the block at `slot` out of epoch batches while still serving it by slot.
    pub fn leave_out_of_batch(&self, slot: Slot) {
        self.script().slots_missing_from_batches.insert(slot);
    }

    pub fn fail_participation(&self, epoch: Epoch) {
        self.script().failing_participation.insert(epoch);
    }

    pub fn set_participation(&self, epoch: Epoch, participation: Participation) {
        self.script().participation.insert(epoch, participation);
    }

    pub fn calls(&self) -> Calls {
        self.script().calls.clone()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("fake source mutex is not poisoned")
    }
}

impl ChainDataSource for FakeSource {
    async fn chain_head(&self) -> Result<ChainHeadSnapshot, DataSourceError> {
        let mut script = self.script();

        script.calls.chain_head += 1;

        let call = script.calls.chain_head;

        if script.failing_chain_head_calls.contains(&call) {
            return Err(transport_error());
        }

        let snapshot = if script.heads.len() > 1 {
            script.heads.pop_front()
        } else {
            script.heads.front().cloned()
        };

        snapshot.ok_or_else(transport_error)
    }

    async fn block_at_slot(&self, slot: Slot) -> Result<Option<SlotBlock>, DataSourceError> {
        let mut script = self.script();

        script.calls.block_at_slot.push(slot);

        if script.failing_slots.remove(&slot) {
            return Err(transport_error());
        }

        if let Some(times) = script.hidden_slots.get_mut(&slot) {
            if *times > 0 {
                *times -= 1;
                return Ok(None);
            }
        }

        Ok(script.blocks.get(&slot).cloned())
    }

    async fn blocks_by_epoch(
        &self,
        epoch: Epoch,
    ) -> Result<Option<Vec<SlotBlock>>, DataSourceError> {
        let mut script = self.script();

        script.calls.blocks_by_epoch.push(epoch);

        if script.failing_batch_epochs.contains(&epoch) {
            return Err(DataSourceError::MalformedResponse {
                url: format!("http://fake/beacon/blocks?epoch={epoch}"),
                message: "missing field `blockContainers`".to_owned(),
            });
        }

        if !script.batch_epochs.contains(&epoch) {
            return Ok(None);
        }

        let mut blocks = script
            .blocks
            .values()
            .filter(|block| block.slot / SLOTS_PER_EPOCH.get() == epoch)
            .filter(|block| !script.slots_missing_from_batches.contains(&block.slot))
            .cloned()
            .collect::<Vec<_>>();

        blocks.sort_by_key(|block| block.slot);

        Ok(Some(blocks))
    }

    async fn participation(&self, epoch: Epoch) -> Result<Option<Participation>, DataSourceError> {
        let mut script = self.script();
        script.calls.participation.push(epoch);

        if script.failing_participation.contains(&epoch) {
            return Err(transport_error());
        }

        Ok(script.participation.get(&epoch).copied())
    }

    async fn genesis_time(&self) -> Result<Option<UnixSeconds>, DataSourceError> {
        Ok(Some(0))
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    pub records: Vec<TimelineRecord>,
}

impl TimelineRenderer for RecordingRenderer {
    fn accept_record(&mut self, record: TimelineRecord) {
        self.records.push(record);
    }
}

impl RecordingRenderer {
    pub fn slot_records(&self) -> Vec<&SlotRecord> {
        self.records
            .iter()
            .filter_map(TimelineRecord::as_slot_record)
            .collect()
    }

    pub fn epoch_records(&self) -> Vec<&EpochRecord> {
        self.records
            .iter()
            .filter_map(TimelineRecord::as_epoch_record)
            .collect()
    }

    pub fn slots(&self) -> Vec<Slot> {
        self.slot_records()
            .into_iter()
            .map(|record| record.slot)
            .collect()
    }
}

/// A valid snapshot with the justified and finalized checkpoints 1 and 2 epochs behind the head.
pub fn snapshot(head_slot: Slot) -> ChainHeadSnapshot {
    let slots_per_epoch = SLOTS_PER_EPOCH.get();
    let head_epoch = head_slot / slots_per_epoch;
    let justified_epoch = head_epoch.saturating_sub(1);
    let finalized_epoch = head_epoch.saturating_sub(2);

    ChainHeadSnapshot {
        head_slot,
        head_epoch,
        head_block_root: Some(root(head_slot)),
        justified_slot: justified_epoch * slots_per_epoch,
        justified_epoch,
        finalized_slot: finalized_epoch * slots_per_epoch,
        finalized_epoch,
    }
}

pub fn block(slot: Slot, parent_slot: Slot) -> SlotBlock {
    SlotBlock {
        slot,
        block_root: root(slot),
        parent_root: root(parent_slot),
    }
}

pub fn root(slot: Slot) -> Root {
    Root::from_bytes(slot.to_be_bytes()).expect("root is not empty")
}

fn transport_error() -> DataSourceError {
    DataSourceError::Transport {
        message: "connection refused".to_owned(),
    }
}
