pub use crate::{
    client::{BeaconNodeClient, NodeResponse, DEFAULT_REQUEST_TIMEOUT},
    data_source::{BeaconNodeApi, ChainDataSource},
    error::DataSourceError,
    prysm::PrysmApi,
    standard::StandardApi,
    teku::TekuApi,
};

mod client;
mod data_source;
mod endpoints;
mod error;
mod legacy;
mod prysm;
mod standard;
mod teku;
