use core::time::Duration;
use std::path::PathBuf;

use beacon_api::{BeaconNodeApi, BeaconNodeClient, PrysmApi, StandardApi, TekuApi};
use chain_tracker::TrackerConfig;
use clap::ValueEnum;
use log::info;
use strum::Display;
use types::config::ChainConfig;
use url::Url;

use crate::predefined_network::PredefinedNetwork;

/// API flavor served by the beacon node.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Display, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
    /// Standard Beacon API (`/eth/v1`)
    #[default]
    Standard,
    /// Prysm gRPC gateway (`/eth/v1alpha1`)
    Prysm,
    /// Legacy Teku REST API
    Teku,
}

impl NodeKind {
    #[must_use]
    pub fn data_source(
        self,
        chain_config: ChainConfig,
        client: BeaconNodeClient,
    ) -> BeaconNodeApi {
        match self {
            Self::Standard => BeaconNodeApi::Standard(StandardApi::new(chain_config, client)),
            Self::Prysm => BeaconNodeApi::Prysm(PrysmApi::new(client)),
            Self::Teku => BeaconNodeApi::Teku(TekuApi::new(client)),
        }
    }
}

#[cfg_attr(test, derive(Debug))]
pub struct TimelineConfig {
    pub predefined_network: Option<PredefinedNetwork>,
    pub chain_config: ChainConfig,
    /// Set for custom networks when no genesis time was given.
    pub fetch_genesis_time: bool,
    pub beacon_node_urls: Vec<Url>,
    pub node_kind: NodeKind,
    pub request_timeout: Duration,
    pub tracker_config: TrackerConfig,
    pub output: Option<PathBuf>,
    pub always_write_style: bool,
}

impl TimelineConfig {
    pub fn report(&self) {
        let Self {
            predefined_network,
            chain_config,
            fetch_genesis_time,
            beacon_node_urls,
            node_kind,
            request_timeout,
            tracker_config,
            output,
            ..
        } = self;

        match predefined_network {
            Some(network) => info!("network: {network}"),
            None => info!("network: custom"),
        }

        info!(
            "slots per epoch: {}, seconds per slot: {}",
            chain_config.slots_per_epoch, chain_config.seconds_per_slot,
        );

        if *fetch_genesis_time {
            info!("genesis time: fetched from beacon node");
        } else {
            info!("genesis time: {}", chain_config.genesis_time);
        }

        info!("beacon node kind: {node_kind}");

        for url in beacon_node_urls {
            info!("beacon node URL: {url}");
        }

        info!("request timeout: {request_timeout:?}");
        info!("poll interval: {:?}", tracker_config.poll_interval);
        info!("lookback epochs: {}", tracker_config.lookback_epochs);
        info!("initial sync attempts: {}", tracker_config.initial_sync_attempts);

        match output {
            Some(path) => info!("timeline output: {}", path.display()),
            None => info!("timeline output: log"),
        }
    }
}
