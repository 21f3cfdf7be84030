//! Client for the REST API Teku served before the standard Beacon API existed.

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use types::phase0::{
    containers::{ChainHeadSnapshot, Participation, SlotBlock},
    primitives::{Epoch, Slot, UnixSeconds},
};

use crate::{
    client::BeaconNodeClient,
    data_source::ChainDataSource,
    error::DataSourceError,
    legacy::{LegacyChainHead, RootEncoding},
};

pub struct TekuApi {
    client: BeaconNodeClient,
}

impl TekuApi {
    #[must_use]
    pub const fn new(client: BeaconNodeClient) -> Self {
        Self { client }
    }
}

impl ChainDataSource for TekuApi {
    async fn chain_head(&self) -> Result<ChainHeadSnapshot, DataSourceError> {
        let response = self.client.get("/beacon/chainhead").await?.ensure_success()?;

        response
            .json::<LegacyChainHead>()?
            .into_snapshot(RootEncoding::Hex)
            .map_err(|error| response.malformed(error))
    }

    async fn block_at_slot(&self, slot: Slot) -> Result<Option<SlotBlock>, DataSourceError> {
        let response = self.client.get(&format!("/beacon/block?slot={slot}")).await?;

        if response.is_not_found() || response.is_empty() {
            return Ok(None);
        }

        let response = response.ensure_success()?;
        let BlockResponse { block, block_root } = response.json()?;

        // Teku answers queries for empty slots with the latest block before them.
        if block.slot != slot {
            return Ok(None);
        }

        Ok(Some(SlotBlock {
            slot,
            block_root: RootEncoding::Hex
                .decode(&block_root)
                .map_err(|error| response.malformed(error))?,
            parent_root: RootEncoding::Hex
                .decode(&block.parent_root)
                .map_err(|error| response.malformed(error))?,
        }))
    }

    async fn blocks_by_epoch(
        &self,
        _epoch: Epoch,
    ) -> Result<Option<Vec<SlotBlock>>, DataSourceError> {
        Ok(None)
    }

    async fn participation(&self, _epoch: Epoch) -> Result<Option<Participation>, DataSourceError> {
        Ok(None)
    }

    async fn genesis_time(&self) -> Result<Option<UnixSeconds>, DataSourceError> {
        let response = self.client.get("/node/genesis_time").await?.ensure_success()?;

        if response.is_empty() {
            return Ok(None);
        }

        let GenesisTime(genesis_time) = response.json()?;

        Ok(Some(genesis_time))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockResponse {
    block: BlockMessage,
    block_root: String,
}

#[serde_as]
#[derive(Deserialize)]
struct BlockMessage {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    slot: Slot,
    parent_root: String,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(transparent)]
struct GenesisTime(#[serde_as(as = "PickFirst<(_, DisplayFromStr)>")] UnixSeconds);
