use thiserror::Error;

/// Failure of a [`ChainDataSource`] operation.
///
/// A block that does not exist is not an error. Operations report it as `Ok(None)`.
///
/// [`ChainDataSource`]: crate::ChainDataSource
#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum DataSourceError {
    #[error("beacon node request failed: {message}")]
    Transport { message: String },
    #[error("malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },
    #[error("attempted to query beacon node but no endpoints were provided")]
    NoEndpointsProvided,
}

impl DataSourceError {
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}
