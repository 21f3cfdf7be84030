use core::{
    fmt::Display,
    num::{NonZeroU32, NonZeroU64},
    time::Duration,
};
use std::path::PathBuf;

use anyhow::{ensure, Result};
use chain_tracker::TrackerConfig;
use chrono::DateTime;
use clap::{error::ErrorKind, Args, CommandFactory as _, Error as ClapError, Parser, ValueEnum};
use thiserror::Error;
use types::{
    config::ChainConfig,
    phase0::{
        consts::{SECONDS_PER_SLOT, SLOTS_PER_EPOCH},
        primitives::UnixSeconds,
    },
};
use url::Url;

use crate::{
    predefined_network::PredefinedNetwork,
    timeline_config::{NodeKind, TimelineConfig},
};

const APPLICATION_NAME: &str = "beacon_timeline";
const DEFAULT_BEACON_NODE_URL: &str = "http://localhost:5052";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Follows a beacon node and reports every slot as proposed or missing
#[derive(Parser)]
#[clap(display_name = APPLICATION_NAME)]
pub struct TimelineArgs {
    #[clap(flatten)]
    chain_options: ChainOptions,

    #[clap(flatten)]
    node_options: NodeOptions,

    #[clap(flatten)]
    tracker_options: TrackerOptions,

    /// Append the timeline to FILE as JSON lines instead of logging it
    #[clap(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Color log output even when it is not written to a terminal
    #[clap(long)]
    log_always_write_style: bool,
}

#[derive(Args)]
struct ChainOptions {
    /// Name of the Eth2 network the beacon node is on
    #[clap(long, value_enum, default_value_t = Network::Mainnet)]
    network: Network,

    /// Genesis time as an ISO-8601 instant or Unix seconds
    /// [default: fetched from the beacon node on custom networks]
    #[clap(long, value_parser = parse_genesis_time)]
    genesis_time: Option<UnixSeconds>,

    /// [default: 32]
    #[clap(long)]
    slots_per_epoch: Option<NonZeroU64>,

    /// [default: 12]
    #[clap(long)]
    seconds_per_slot: Option<NonZeroU64>,
}

#[derive(Args)]
struct NodeOptions {
    /// Beacon node API URLs; later URLs are used when earlier ones fail
    #[clap(
        long,
        num_args = 1..,
        value_delimiter = ',',
        default_value = DEFAULT_BEACON_NODE_URL,
    )]
    beacon_node_urls: Vec<Url>,

    /// API served by the beacon node
    #[clap(long, value_enum, default_value_t = NodeKind::default())]
    node_kind: NodeKind,

    /// Timeout for each request to the beacon node
    #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    request_timeout_ms: u64,
}

#[derive(Args)]
struct TrackerOptions {
    /// [default: one slot]
    #[clap(long)]
    poll_interval_ms: Option<u64>,

    /// Number of epochs before the head epoch to report on startup
    #[clap(long, default_value_t = TrackerConfig::default().lookback_epochs)]
    lookback_epochs: u64,

    /// Number of attempts to resolve the head block on startup
    #[clap(long, default_value_t = TrackerConfig::default().initial_sync_attempts)]
    initial_sync_attempts: NonZeroU32,
}

#[derive(Clone, Copy, ValueEnum)]
enum Network {
    Mainnet,
    Sepolia,
    Holesky,
    Hoodi,
    Custom,
}

impl Network {
    const fn predefined_network(self) -> Option<PredefinedNetwork> {
        match self {
            Self::Mainnet => Some(PredefinedNetwork::Mainnet),
            Self::Sepolia => Some(PredefinedNetwork::Sepolia),
            Self::Holesky => Some(PredefinedNetwork::Holesky),
            Self::Hoodi => Some(PredefinedNetwork::Hoodi),
            Self::Custom => None,
        }
    }
}

impl TimelineArgs {
    pub fn try_into_config(self) -> Result<TimelineConfig> {
        let Self {
            chain_options,
            node_options,
            tracker_options,
            output,
            log_always_write_style,
        } = self;

        let ChainOptions {
            network,
            genesis_time,
            slots_per_epoch,
            seconds_per_slot,
        } = chain_options;

        let NodeOptions {
            beacon_node_urls,
            node_kind,
            request_timeout_ms,
        } = node_options;

        let TrackerOptions {
            poll_interval_ms,
            lookback_epochs,
            initial_sync_attempts,
        } = tracker_options;

        let predefined_network = network.predefined_network();

        let mut chain_config = predefined_network.map_or_else(
            || ChainConfig::custom(SLOTS_PER_EPOCH, SECONDS_PER_SLOT),
            PredefinedNetwork::chain_config,
        );

        if let Some(slots_per_epoch) = slots_per_epoch {
            chain_config.slots_per_epoch = slots_per_epoch;
        }

        if let Some(seconds_per_slot) = seconds_per_slot {
            chain_config.seconds_per_slot = seconds_per_slot;
        }

        if let Some(genesis_time) = genesis_time {
            chain_config.genesis_time = genesis_time;
        }

        ensure!(request_timeout_ms > 0, Error::ZeroRequestTimeout);

        let mut tracker_config = TrackerConfig {
            lookback_epochs,
            initial_sync_attempts,
            ..TrackerConfig::for_chain(&chain_config)
        };

        if let Some(poll_interval_ms) = poll_interval_ms {
            ensure!(poll_interval_ms > 0, Error::ZeroPollInterval);
            tracker_config.poll_interval = Duration::from_millis(poll_interval_ms);
        }

        Ok(TimelineConfig {
            predefined_network,
            fetch_genesis_time: predefined_network.is_none() && genesis_time.is_none(),
            chain_config,
            beacon_node_urls,
            node_kind,
            request_timeout: Duration::from_millis(request_timeout_ms),
            tracker_config,
            output,
            always_write_style: log_always_write_style,
        })
    }

    pub fn clap_error(message: impl Display) -> ClapError {
        Self::command().error(ErrorKind::ValueValidation, message)
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("genesis time is before the Unix epoch")]
    GenesisTimeBeforeUnixEpoch,
    #[error("--poll-interval-ms must be greater than 0")]
    ZeroPollInterval,
    #[error("--request-timeout-ms must be greater than 0")]
    ZeroRequestTimeout,
}

fn parse_genesis_time(string: &str) -> Result<UnixSeconds> {
    if let Ok(unix_seconds) = string.parse() {
        return Ok(unix_seconds);
    }

    let timestamp = DateTime::parse_from_rfc3339(string)?.timestamp();

    UnixSeconds::try_from(timestamp).map_err(|_| Error::GenesisTimeBeforeUnixEpoch.into())
}
