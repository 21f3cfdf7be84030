//! Client for the Prysm `eth/v1alpha1` gRPC gateway.
//!
//! Numbers are encoded as decimal strings and roots as base64.

use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use types::phase0::{
    containers::{ChainHeadSnapshot, Participation, SlotBlock},
    primitives::{Epoch, Gwei, Slot, UnixSeconds},
};

use crate::{
    client::{BeaconNodeClient, NodeResponse},
    data_source::ChainDataSource,
    error::DataSourceError,
    legacy::{LegacyChainHead, RootEncoding},
};

pub struct PrysmApi {
    client: BeaconNodeClient,
}

impl PrysmApi {
    #[must_use]
    pub const fn new(client: BeaconNodeClient) -> Self {
        Self { client }
    }

    fn block_containers(response: &NodeResponse) -> Result<Vec<SlotBlock>, DataSourceError> {
        let ListBlocksResponse { block_containers } = response.json()?;

        block_containers
            .ok_or_else(|| response.malformed("missing field `blockContainers`"))?
            .into_iter()
            .map(|container| container.try_into_slot_block(response))
            .collect()
    }
}

impl ChainDataSource for PrysmApi {
    async fn chain_head(&self) -> Result<ChainHeadSnapshot, DataSourceError> {
        let response = self.client.get("/beacon/chainhead").await?.ensure_success()?;

        response
            .json::<LegacyChainHead>()?
            .into_snapshot(RootEncoding::Base64)
            .map_err(|error| response.malformed(error))
    }

    async fn block_at_slot(&self, slot: Slot) -> Result<Option<SlotBlock>, DataSourceError> {
        let response = self
            .client
            .get(&format!("/beacon/blocks?slot={slot}"))
            .await?
            .ensure_success()?;

        let mut blocks = Self::block_containers(&response)?;

        // More than one block at a slot means the node also returned orphaned blocks.
        // The canonical one cannot be told apart in this API, so the slot is reported as empty.
        if blocks.len() == 1 {
            Ok(blocks.pop())
        } else {
            Ok(None)
        }
    }

    async fn blocks_by_epoch(
        &self,
        epoch: Epoch,
    ) -> Result<Option<Vec<SlotBlock>>, DataSourceError> {
        let response = self.client.get(&format!("/beacon/blocks?epoch={epoch}")).await?;

        // The gRPC gateway answers with an empty body when the underlying call fails.
        if response.is_empty() || !response.status().is_success() {
            info!("could not get blocks for epoch {epoch} (gRPC gateway error)");
            return Ok(None);
        }

        let mut blocks = Self::block_containers(&response)?;
        blocks.sort_by_key(|block| block.slot);

        Ok(Some(blocks))
    }

    async fn participation(&self, epoch: Epoch) -> Result<Option<Participation>, DataSourceError> {
        let response = self
            .client
            .get(&format!("/validators/participation?epoch={epoch}"))
            .await?;

        if response.is_empty() || !response.status().is_success() {
            return Ok(None);
        }

        let ParticipationResponse { participation } = response.json()?;

        Ok(participation.map(Into::into))
    }

    async fn genesis_time(&self) -> Result<Option<UnixSeconds>, DataSourceError> {
        let response = self.client.get("/node/genesis").await?.ensure_success()?;
        let GenesisResponse { genesis_time } = response.json()?;

        let Some(genesis_time) = genesis_time else {
            return Ok(None);
        };

        UnixSeconds::try_from(genesis_time.timestamp())
            .map(Some)
            .map_err(|error| response.malformed(error))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListBlocksResponse {
    block_containers: Option<Vec<BlockContainer>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockContainer {
    block: SignedBlock,
    block_root: String,
}

impl BlockContainer {
    fn try_into_slot_block(self, response: &NodeResponse) -> Result<SlotBlock, DataSourceError> {
        let Self { block, block_root } = self;
        let BlockMessage { slot, parent_root } = block.block;

        Ok(SlotBlock {
            slot,
            block_root: RootEncoding::Base64
                .decode(&block_root)
                .map_err(|error| response.malformed(error))?,
            parent_root: RootEncoding::Base64
                .decode(&parent_root)
                .map_err(|error| response.malformed(error))?,
        })
    }
}

#[derive(Deserialize)]
struct SignedBlock {
    block: BlockMessage,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockMessage {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    slot: Slot,
    parent_root: String,
}

#[derive(Deserialize)]
struct ParticipationResponse {
    participation: Option<RawParticipation>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParticipation {
    global_participation_rate: f64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    voted_ether: Gwei,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    eligible_ether: Gwei,
}

impl From<RawParticipation> for Participation {
    fn from(raw: RawParticipation) -> Self {
        Self {
            global_participation_rate: raw.global_participation_rate,
            voted_ether: raw.voted_ether,
            eligible_ether: raw.eligible_ether,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenesisResponse {
    genesis_time: Option<DateTime<Utc>>,
}
