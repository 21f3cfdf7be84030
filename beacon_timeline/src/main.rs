use core::future::Future;
use std::process::ExitCode;

use anyhow::Result;
use beacon_api::{BeaconNodeClient, ChainDataSource as _};
use chain_tracker::{ChainStateTracker, TimelineRenderer};
use clap::{Error as ClapError, Parser as _};
use log::{error, info, warn};
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

use crate::{
    renderers::{JsonLinesRenderer, LogRenderer},
    timeline_args::TimelineArgs,
    timeline_config::TimelineConfig,
};

mod predefined_network;
mod renderers;
mod timeline_args;
mod timeline_config;

#[derive(Debug, Error)]
enum Error {
    #[error("beacon node does not report a genesis time; pass --genesis-time")]
    GenesisTimeUnavailable,
}

fn main() -> ExitCode {
    if let Err(error) = try_main() {
        error.downcast_ref().map(ClapError::exit);
        error!("{error:?}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    let config = TimelineArgs::try_parse()?
        .try_into_config()
        .map_err(TimelineArgs::clap_error)?;

    binary_utils::initialize_logger(module_path!(), config.always_write_style)?;

    info!("starting beacon timeline");
    config.report();

    block_on(run(config))
}

async fn run(config: TimelineConfig) -> Result<()> {
    let TimelineConfig {
        mut chain_config,
        fetch_genesis_time,
        beacon_node_urls,
        node_kind,
        request_timeout,
        tracker_config,
        output,
        ..
    } = config;

    let client = BeaconNodeClient::new(Client::new(), beacon_node_urls, request_timeout);
    let source = node_kind.data_source(chain_config.clone(), client);

    if fetch_genesis_time {
        let genesis_time = source
            .genesis_time()
            .await?
            .ok_or(Error::GenesisTimeUnavailable)?;

        info!("genesis time reported by beacon node: {genesis_time}");

        chain_config = chain_config.with_genesis_time(genesis_time);
    }

    let renderer: Box<dyn TimelineRenderer> = match output {
        Some(path) => Box::new(JsonLinesRenderer::create(&path)?),
        None => Box::new(LogRenderer::new(chain_config.clone())),
    };

    let cancellation = CancellationToken::new();

    tokio::spawn(cancel_on_ctrl_c(cancellation.clone()));

    let ticks = clock::ticks(&chain_config, tracker_config.poll_interval)?;

    let tracker = ChainStateTracker::new(chain_config, tracker_config, source, renderer)
        .with_cancellation(cancellation.clone());

    let health = tracker.health();

    tracker.run(ticks, cancellation).await?;

    let health = health.load();

    match health.last_successful_sync {
        Some(time) => info!("last successful sync at {time}"),
        None => warn!("beacon node was never synced"),
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancellation: CancellationToken) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!("could not listen for Ctrl-C: {error}");
        return;
    }

    info!("received Ctrl-C; stopping");

    cancellation.cancel();
}

fn block_on(future: impl Future<Output = Result<()>>) -> Result<()> {
    Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
