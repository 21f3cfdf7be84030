use core::ops::RangeInclusive;
use std::collections::BTreeMap;

use anyhow::{Error as AnyhowError, Result};
use beacon_api::{ChainDataSource, DataSourceError};
use clock::{Tick, WallClock};
use futures::stream::{Stream, StreamExt as _};
use helper_functions::{classification, misc};
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;
use types::{
    config::ChainConfig,
    nonstandard::{EpochRecord, EpochRecordKind, SlotRecord, SlotStatus, TimelineRecord},
    phase0::{
        containers::{ChainHeadSnapshot, Participation, SlotBlock},
        primitives::{Epoch, Slot},
    },
};

use crate::{
    config::TrackerConfig,
    error::{InvariantViolation, TrackerError},
    health::{HealthHandle, TrackerPhase},
    renderer::TimelineRenderer,
    state::TrackerState,
    status::StatusReport,
};

/// Reconciles the chain as reported by a [`ChainDataSource`] with the records already emitted.
///
/// Every slot from the start of the lookback window up to the latest head is emitted exactly once,
/// in ascending order, as either proposed or missing.
/// Slots that could not be fetched are retried in the next cycle rather than reported as missing.
pub struct ChainStateTracker<S, R> {
    chain_config: ChainConfig,
    config: TrackerConfig,
    source: S,
    renderer: R,
    state: TrackerState,
    health: HealthHandle,
    cancellation: CancellationToken,
}

impl<S: ChainDataSource, R: TimelineRenderer> ChainStateTracker<S, R> {
    #[must_use]
    pub fn new(chain_config: ChainConfig, config: TrackerConfig, source: S, renderer: R) -> Self {
        Self {
            chain_config,
            config,
            source,
            renderer,
            state: TrackerState::default(),
            health: HealthHandle::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Makes retries during the initial sync stop early when `cancellation` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    #[must_use]
    pub fn health(&self) -> HealthHandle {
        self.health.clone()
    }

    #[must_use]
    pub const fn state(&self) -> &TrackerState {
        &self.state
    }

    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    #[must_use]
    pub const fn status_report(&self, clock: WallClock) -> Option<StatusReport> {
        if !self.state.is_initialized() {
            return None;
        }

        Some(StatusReport::new(
            &self.chain_config,
            clock,
            &self.state.snapshot,
        ))
    }

    /// Consumes `ticks` one at a time until `cancellation` is cancelled or the stream ends.
    ///
    /// A cycle in progress when `cancellation` fires is dropped at its next suspension point.
    /// Records emitted before that point stay emitted.
    pub async fn run(
        mut self,
        mut ticks: impl Stream<Item = Result<Tick>> + Unpin,
        cancellation: CancellationToken,
    ) -> Result<R> {
        loop {
            let tick = tokio::select! {
                () = cancellation.cancelled() => break,
                tick = ticks.next() => tick,
            };

            let Some(tick) = tick else {
                break;
            };

            let tick = tick?;

            let outcome = tokio::select! {
                () = cancellation.cancelled() => {
                    info!("cancelling chain tracker cycle in progress");
                    break;
                }
                outcome = self.handle_tick(tick) => outcome,
            };

            if let Err(error) = outcome {
                if let Some(TrackerError::Cancelled) = error.downcast_ref() {
                    break;
                }

                handle_error(&error);
            }
        }

        self.set_phase(TrackerPhase::Stopped);

        info!("chain tracker stopped");

        Ok(self.renderer)
    }

    pub async fn handle_tick(&mut self, tick: Tick) -> Result<()> {
        match tick {
            Tick::Poll if self.state.is_initialized() => {
                let last_emitted_slot = self.state.last_emitted_slot;

                self.poll().await?;

                if self.state.last_emitted_slot != last_emitted_slot {
                    self.log_status_report();
                }
            }
            Tick::Poll => {
                self.initial_sync().await?;
                self.announce_scheduled_epoch(WallClock::now(&self.chain_config)?);
                self.log_status_report();
            }
            Tick::EpochStart(epoch) => {
                let start_slot = misc::compute_start_slot_at_epoch(&self.chain_config, epoch);

                info!("epoch {epoch} started");

                if self.state.is_initialized() {
                    self.announce_scheduled_epoch(WallClock::at_slot(
                        &self.chain_config,
                        start_slot,
                    ));
                }
            }
        }

        Ok(())
    }

    /// Resolves the head and backfills the lookback window.
    ///
    /// Retries with exponential backoff until the head slot resolves to a present block.
    pub async fn initial_sync(&mut self) -> Result<()> {
        let result = self.try_initial_sync().await;
        self.record_outcome(&result);
        result
    }

    /// Runs one steady-state cycle. Runs the initial sync instead if it has not succeeded yet.
    pub async fn poll(&mut self) -> Result<()> {
        if !self.state.is_initialized() {
            return self.initial_sync().await;
        }

        let result = self.try_poll().await;

        if self.state.phase == TrackerPhase::ReconcilingGap {
            self.set_phase(TrackerPhase::SteadyPolling);
        }

        self.record_outcome(&result);
        result
    }

    /// Emits a scheduled [`EpochRecord`] for the next epoch on the wall clock, once per epoch.
    pub fn announce_scheduled_epoch(&mut self, clock: WallClock) {
        let epoch = clock.scheduled_epoch;

        if self
            .state
            .last_scheduled_epoch
            .is_some_and(|scheduled| epoch <= scheduled)
        {
            return;
        }

        info!(
            "scheduled epoch {epoch} starts in {} slots",
            clock.countdown(&self.chain_config),
        );

        self.emit_epoch(epoch, EpochRecordKind::Scheduled, None);
        self.state.last_scheduled_epoch = Some(epoch);
    }

    async fn try_initial_sync(&mut self) -> Result<()> {
        self.set_phase(TrackerPhase::SyncingInitial);

        let (snapshot, head_block) = self.resolve_head().await?;

        let chain_config = &self.chain_config;
        let head_slot = snapshot.head_slot;
        let head_epoch = misc::compute_epoch_at_slot(chain_config, head_slot);
        let first_epoch = head_epoch.saturating_sub(self.config.lookback_epochs);

        info!(
            "starting from head slot {head_slot} (epoch {head_epoch}), \
             justified {}/{}, finalized {}/{}",
            snapshot.justified_slot,
            snapshot.justified_epoch,
            snapshot.finalized_slot,
            snapshot.finalized_epoch,
        );

        self.state = TrackerState {
            previous_slot: head_slot,
            previous_epoch: snapshot.head_epoch,
            thresholds: snapshot.thresholds(),
            first_slot: misc::compute_start_slot_at_epoch(chain_config, first_epoch),
            snapshot,
            last_scheduled_epoch: self.state.last_scheduled_epoch,
            ..TrackerState::default()
        };

        info!("getting blocks for epochs {first_epoch}..={head_epoch}");

        // A failure here does not fail the sync.
        // The next cycle resumes from the first slot that was not emitted.
        if let Err(error) = self.backfill(first_epoch..=head_epoch, head_block).await {
            warn!("backfill stopped early: {error}");
        }

        self.set_phase(TrackerPhase::SteadyPolling);

        Ok(())
    }

    async fn resolve_head(&self) -> Result<(ChainHeadSnapshot, SlotBlock)> {
        let attempts = self.config.initial_sync_attempts.get();

        for attempt in 1..=attempts {
            match self.try_resolve_head().await {
                Ok(Some(resolved)) => return Ok(resolved),
                Ok(None) => debug!("head block is not available yet (attempt {attempt}/{attempts})"),
                Err(error) => match error.downcast_ref() {
                    Some(TrackerError::InvariantViolation(violation)) => {
                        error!("discarding chain head (attempt {attempt}/{attempts}): {violation}");
                    }
                    _ => warn!("could not resolve head (attempt {attempt}/{attempts}): {error}"),
                },
            }

            if attempt < attempts {
                let delay = self.config.retry_delay(attempt - 1);

                tokio::select! {
                    () = self.cancellation.cancelled() => return Err(TrackerError::Cancelled.into()),
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(TrackerError::SourceUnavailable { attempts }.into())
    }

    async fn try_resolve_head(&self) -> Result<Option<(ChainHeadSnapshot, SlotBlock)>> {
        let snapshot = self.source.chain_head().await?;

        snapshot.validate().map_err(TrackerError::from)?;

        let head_block = self.source.block_at_slot(snapshot.head_slot).await?;

        Ok(head_block.map(|block| (snapshot, block)))
    }

    async fn backfill(
        &mut self,
        epochs: RangeInclusive<Epoch>,
        head_block: SlotBlock,
    ) -> Result<(), DataSourceError> {
        let head_slot = self.state.snapshot.head_slot;
        let mut head_block = Some(head_block);

        for epoch in epochs {
            let participation = match self.source.participation(epoch).await {
                Ok(participation) => participation,
                Err(error) => {
                    warn!("could not get participation for epoch {epoch}: {error}");
                    None
                }
            };

            self.emit_epoch(epoch, EpochRecordKind::Observed, participation);
            self.state.last_emitted_epoch = Some(epoch);

            let start_slot = misc::compute_start_slot_at_epoch(&self.chain_config, epoch);
            let end_slot = misc::compute_start_slot_at_epoch(&self.chain_config, epoch + 1) - 1;
            let slots = start_slot..=end_slot.min(head_slot);

            match self.source.blocks_by_epoch(epoch).await {
                Ok(Some(blocks)) => {
                    let mut blocks = blocks
                        .into_iter()
                        .filter(|block| slots.contains(&block.slot))
                        .map(|block| (block.slot, block))
                        .collect::<BTreeMap<_, _>>();

                    debug!("got {} blocks for epoch {epoch}", blocks.len());

                    for slot in slots {
                        let block = blocks
                            .remove(&slot)
                            .or_else(|| head_block.take_if(|block| block.slot == slot));

                        self.emit_slot(slot, block);
                    }
                }
                outcome => {
                    match outcome {
                        Err(error) => info!(
                            "could not get blocks for epoch {epoch} ({error}); \
                             probing each slot instead",
                        ),
                        _ => info!("blocks for epoch {epoch} unavailable; probing each slot instead"),
                    }

                    for slot in slots {
                        let block = match head_block.take_if(|block| block.slot == slot) {
                            Some(block) => Some(block),
                            None => self.source.block_at_slot(slot).await?,
                        };

                        self.emit_slot(slot, block);
                    }
                }
            }
        }

        Ok(())
    }

    async fn try_poll(&mut self) -> Result<()> {
        let previous_slot = self.state.snapshot.head_slot;

        self.state.previous_slot = previous_slot;
        self.state.previous_epoch = self.state.snapshot.head_epoch;

        let snapshot = self.source.chain_head().await?;

        if let Err(violation) = snapshot.validate() {
            error!("discarding chain head: {violation}");
            return Err(TrackerError::from(violation).into());
        }

        let head_slot = snapshot.head_slot;

        if head_slot < previous_slot {
            let violation = InvariantViolation::HeadRegressed {
                previous: previous_slot,
                current: head_slot,
            };

            error!("discarding chain head: {violation}");

            return Err(TrackerError::from(violation).into());
        }

        let delta = head_slot - previous_slot;

        match delta {
            0 => debug!("no new slot since {previous_slot}"),
            1 => debug!("new head slot {head_slot}"),
            _ => {
                info!("{delta} slots since {previous_slot}; reconciling gap up to {head_slot}");
                self.set_phase(TrackerPhase::ReconcilingGap);
            }
        }

        self.state.thresholds = snapshot.thresholds();
        self.state.snapshot = snapshot;

        self.walk_to(head_slot).await?;
        self.prune_root_index();

        Ok(())
    }

    /// Emits every slot after the last emitted one up to `target` in ascending order.
    ///
    /// Stops at the first slot that cannot be fetched.
    async fn walk_to(&mut self, target: Slot) -> Result<(), DataSourceError> {
        let first_slot = self.state.next_slot();

        if first_slot <= self.state.previous_slot {
            info!("resuming walk at slot {first_slot}");
        }

        for slot in first_slot..=target {
            let epoch = misc::compute_epoch_at_slot(&self.chain_config, slot);

            if misc::is_epoch_start(&self.chain_config, slot) && !self.state.is_epoch_emitted(epoch)
            {
                self.refresh_thresholds().await;
                self.emit_epoch(epoch, EpochRecordKind::Observed, None);
                self.state.last_emitted_epoch = Some(epoch);
            }

            debug!("getting block at slot {slot}");

            let block = match self.source.block_at_slot(slot).await {
                Ok(block) => block,
                Err(error) => {
                    warn!("could not get block at slot {slot}; retrying next cycle: {error}");
                    return Err(error);
                }
            };

            self.emit_slot(slot, block);
        }

        Ok(())
    }

    /// Updates finality thresholds from a fresh chain head without moving the walk target.
    async fn refresh_thresholds(&mut self) {
        match self.source.chain_head().await {
            Ok(snapshot) => match snapshot.validate() {
                Ok(()) => {
                    debug!(
                        "refreshed thresholds: justified {}, finalized {}",
                        snapshot.justified_slot, snapshot.finalized_slot,
                    );

                    self.state.thresholds = snapshot.thresholds();
                }
                Err(violation) => error!("ignoring refreshed chain head: {violation}"),
            },
            Err(error) => warn!("could not refresh thresholds; keeping previous ones: {error}"),
        }
    }

    fn emit_slot(&mut self, slot: Slot, block: Option<SlotBlock>) {
        if self.state.is_emitted(slot) {
            return;
        }

        let chain_config = &self.chain_config;
        let state = &mut self.state;

        let mut record = SlotRecord {
            slot,
            epoch: misc::compute_epoch_at_slot(chain_config, slot),
            status: SlotStatus::Missing,
            finality: classification::classify_slot(state.thresholds, slot),
            time: misc::time_at_slot(chain_config, slot),
            block_root: None,
            parent_root: None,
            parent_slot: None,
        };

        match block {
            Some(SlotBlock {
                block_root,
                parent_root,
                ..
            }) => {
                match &state.previous_block_root {
                    Some(previous_root) if *previous_root != parent_root => warn!(
                        "lineage break at slot {slot}: parent {parent_root} \
                         is not the previous block {previous_root}",
                    ),
                    _ => {}
                }

                state.roots.insert(block_root.clone(), slot);
                state.previous_block_root = Some(block_root.clone());

                record.status = SlotStatus::Proposed;
                record.parent_slot = state.roots.slot(&parent_root);
                record.block_root = Some(block_root);
                record.parent_root = Some(parent_root);
            }
            None => info!("slot {slot} is missing a block"),
        }

        debug!(
            "{} | {} / {} | {} | {} | {}",
            record.slot,
            record.parent_root.as_ref().map(|root| root.short()).unwrap_or_default(),
            record.block_root.as_ref().map(|root| root.short()).unwrap_or_default(),
            misc::slots_since_epoch_start(chain_config, slot),
            record.finality,
            record.epoch,
        );

        state.last_emitted_slot = Some(slot);

        self.renderer.accept_record(TimelineRecord::Slot(record));
    }

    fn emit_epoch(
        &mut self,
        epoch: Epoch,
        kind: EpochRecordKind,
        participation: Option<Participation>,
    ) {
        let finality = classification::classify_epoch(self.state.thresholds, epoch);

        if kind == EpochRecordKind::Observed {
            info!("epoch {epoch} reached ({finality})");
        }

        self.renderer.accept_record(TimelineRecord::Epoch(EpochRecord {
            epoch,
            label: epoch.to_string(),
            kind,
            finality,
            time: misc::time_at_epoch(&self.chain_config, epoch),
            participation,
        }));
    }

    fn prune_root_index(&mut self) {
        let oldest_epoch = self
            .state
            .snapshot
            .head_epoch
            .saturating_sub(self.config.lookback_epochs);

        let oldest_slot = misc::compute_start_slot_at_epoch(&self.chain_config, oldest_epoch);

        self.state.roots.prune_below(oldest_slot);
    }

    fn log_status_report(&self) {
        match WallClock::now(&self.chain_config) {
            Ok(clock) => {
                if let Some(report) = self.status_report(clock) {
                    info!("{report}");
                }
            }
            Err(error) => warn!("could not read wall clock: {error}"),
        }
    }

    fn set_phase(&mut self, phase: TrackerPhase) {
        self.state.phase = phase;
        self.health.set_phase(phase);
    }

    fn record_outcome(&self, result: &Result<()>) {
        match result {
            Ok(()) => self.health.record_success(),
            Err(error) => self.health.record_failure(error),
        }
    }
}

fn handle_error(error: &AnyhowError) {
    match error.downcast_ref() {
        Some(TrackerError::InvariantViolation(_) | TrackerError::SourceUnavailable { .. }) => {
            error!("{error}");
        }
        _ => warn!("chain tracker cycle failed: {error:#}"),
    }
}
