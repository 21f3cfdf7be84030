use core::future::Future;

use types::phase0::{
    containers::{ChainHeadSnapshot, Participation, SlotBlock},
    primitives::{Epoch, Slot, UnixSeconds},
};

use crate::{error::DataSourceError, prysm::PrysmApi, standard::StandardApi, teku::TekuApi};

/// Read access to the chain as seen by one beacon node.
///
/// `Ok(None)` always means the node answered and has nothing to offer:
/// - [`block_at_slot`] returns it for a slot that is confirmed empty;
/// - [`blocks_by_epoch`] returns it when the batch query is unsupported or failed on the node side,
///   in which case callers should probe each slot individually.
///   This is distinct from `Ok(Some(vec![]))`, an epoch that is known to have no blocks.
///
/// [`block_at_slot`]:   ChainDataSource::block_at_slot
/// [`blocks_by_epoch`]: ChainDataSource::blocks_by_epoch
pub trait ChainDataSource: Send + Sync {
    fn chain_head(&self)
        -> impl Future<Output = Result<ChainHeadSnapshot, DataSourceError>> + Send;

    fn block_at_slot(
        &self,
        slot: Slot,
    ) -> impl Future<Output = Result<Option<SlotBlock>, DataSourceError>> + Send;

    /// Blocks in `epoch` ordered by slot.
    fn blocks_by_epoch(
        &self,
        epoch: Epoch,
    ) -> impl Future<Output = Result<Option<Vec<SlotBlock>>, DataSourceError>> + Send;

    fn participation(
        &self,
        epoch: Epoch,
    ) -> impl Future<Output = Result<Option<Participation>, DataSourceError>> + Send;

    fn genesis_time(
        &self,
    ) -> impl Future<Output = Result<Option<UnixSeconds>, DataSourceError>> + Send;
}

/// Data source selected at runtime by the kind of beacon node being queried.
pub enum BeaconNodeApi {
    Standard(StandardApi),
    Prysm(PrysmApi),
    Teku(TekuApi),
}

impl ChainDataSource for BeaconNodeApi {
    async fn chain_head(&self) -> Result<ChainHeadSnapshot, DataSourceError> {
        match self {
            Self::Standard(api) => api.chain_head().await,
            Self::Prysm(api) => api.chain_head().await,
            Self::Teku(api) => api.chain_head().await,
        }
    }

    async fn block_at_slot(&self, slot: Slot) -> Result<Option<SlotBlock>, DataSourceError> {
        match self {
            Self::Standard(api) => api.block_at_slot(slot).await,
            Self::Prysm(api) => api.block_at_slot(slot).await,
            Self::Teku(api) => api.block_at_slot(slot).await,
        }
    }

    async fn blocks_by_epoch(
        &self,
        epoch: Epoch,
    ) -> Result<Option<Vec<SlotBlock>>, DataSourceError> {
        match self {
            Self::Standard(api) => api.blocks_by_epoch(epoch).await,
            Self::Prysm(api) => api.blocks_by_epoch(epoch).await,
            Self::Teku(api) => api.blocks_by_epoch(epoch).await,
        }
    }

    async fn participation(&self, epoch: Epoch) -> Result<Option<Participation>, DataSourceError> {
        match self {
            Self::Standard(api) => api.participation(epoch).await,
            Self::Prysm(api) => api.participation(epoch).await,
            Self::Teku(api) => api.participation(epoch).await,
        }
    }

    async fn genesis_time(&self) -> Result<Option<UnixSeconds>, DataSourceError> {
        match self {
            Self::Standard(api) => api.genesis_time().await,
            Self::Prysm(api) => api.genesis_time().await,
            Self::Teku(api) => api.genesis_time().await,
        }
    }
}
