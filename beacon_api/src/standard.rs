//! Client for the standard Beacon API (`/eth/v1`) served by every current consensus client.

use helper_functions::misc;
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use types::{
    config::ChainConfig,
    phase0::{
        containers::{ChainHeadSnapshot, Participation, SlotBlock},
        primitives::{Epoch, Root, Slot, UnixSeconds},
    },
};

use crate::{client::BeaconNodeClient, data_source::ChainDataSource, error::DataSourceError};

pub struct StandardApi {
    chain_config: ChainConfig,
    client: BeaconNodeClient,
}

impl StandardApi {
    #[must_use]
    pub const fn new(chain_config: ChainConfig, client: BeaconNodeClient) -> Self {
        Self {
            chain_config,
            client,
        }
    }

    async fn header(&self, block_id: &str) -> Result<Option<SlotBlock>, DataSourceError> {
        let response = self
            .client
            .get(&format!("/eth/v1/beacon/headers/{block_id}"))
            .await?;

        if response.is_not_found() {
            return Ok(None);
        }

        let response = response.ensure_success()?;
        let Data { data } = response.json::<Data<HeaderResponse>>()?;
        let HeaderResponse { root, header } = data;

        Ok(Some(SlotBlock {
            slot: header.message.slot,
            block_root: root,
            parent_root: header.message.parent_root,
        }))
    }
}

impl ChainDataSource for StandardApi {
    async fn chain_head(&self) -> Result<ChainHeadSnapshot, DataSourceError> {
        let Some(head) = self.header("head").await? else {
            return Err(DataSourceError::Transport {
                message: "beacon node has no head block".to_owned(),
            });
        };

        let response = self
            .client
            .get("/eth/v1/beacon/states/head/finality_checkpoints")
            .await?
            .ensure_success()?;

        let Data { data } = response.json::<Data<FinalityCheckpoints>>()?;
        let FinalityCheckpoints {
            current_justified,
            finalized,
        } = data;

        let config = &self.chain_config;

        Ok(ChainHeadSnapshot {
            head_slot: head.slot,
            head_epoch: misc::compute_epoch_at_slot(config, head.slot),
            head_block_root: Some(head.block_root),
            justified_slot: misc::compute_start_slot_at_epoch(config, current_justified.epoch),
            justified_epoch: current_justified.epoch,
            finalized_slot: misc::compute_start_slot_at_epoch(config, finalized.epoch),
            finalized_epoch: finalized.epoch,
        })
    }

    async fn block_at_slot(&self, slot: Slot) -> Result<Option<SlotBlock>, DataSourceError> {
        self.header(&slot.to_string()).await
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
        let response = self.client.get("/eth/v1/beacon/genesis").await?;

        // Nodes answer 404 until the chain has started.
        if response.is_not_found() {
            return Ok(None);
        }

        let Data { data } = response.ensure_success()?.json::<Data<Genesis>>()?;

        Ok(Some(data.genesis_time))
    }
}

#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Deserialize)]
struct HeaderResponse {
    root: Root,
    header: SignedHeader,
}

#[derive(Deserialize)]
struct SignedHeader {
    message: HeaderMessage,
}

#[serde_as]
#[derive(Deserialize)]
struct HeaderMessage {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    slot: Slot,
    parent_root: Root,
}

#[derive(Deserialize)]
struct FinalityCheckpoints {
    current_justified: Checkpoint,
    finalized: Checkpoint,
}

#[serde_as]
#[derive(Deserialize)]
struct Checkpoint {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    epoch: Epoch,
}

#[serde_as]
#[derive(Deserialize)]
struct Genesis {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    genesis_time: UnixSeconds,
}
