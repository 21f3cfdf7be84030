use core::time::Duration;

use futures::lock::Mutex;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    endpoints::{self, Endpoints},
    error::DataSourceError,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by all beacon node APIs.
///
/// Requests go to the endpoint that answered last, then to the others in order.
/// Transport failures and server errors move on to the next endpoint.
/// Client errors are returned to the caller because they usually mean the resource does not exist.
pub struct BeaconNodeClient {
    client: Client,
    endpoints: Mutex<Endpoints>,
    timeout: Duration,
}

impl BeaconNodeClient {
    #[must_use]
    pub fn new(client: Client, urls: impl IntoIterator<Item = Url>, timeout: Duration) -> Self {
        Self {
            client,
            endpoints: Mutex::new(Endpoints::new(urls)),
            timeout,
        }
    }

    pub async fn get(&self, path_and_query: &str) -> Result<NodeResponse, DataSourceError> {
        let attempt_order = self.endpoints.lock().await.attempt_order();
        let mut attempts = attempt_order.iter().peekable();
        let mut last_error = None;

        while let Some((index, url)) = attempts.next() {
            match self.try_get(url, path_and_query).await {
                Ok(response) => {
                    self.endpoints.lock().await.mark_answered(*index);
                    return Ok(response);
                }
                Err(error) => {
                    match attempts.peek() {
                        Some((_, next_url)) => warn!(
                            "beacon node endpoint {url} returned an error: {error}; \
                             switching to {next_url}",
                        ),
                        None => warn!(
                            "last available beacon node endpoint {url} returned an error: {error}",
                        ),
                    }

                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(message) => Err(DataSourceError::Transport { message }),
            None => Err(DataSourceError::NoEndpointsProvided),
        }
    }

    async fn try_get(&self, base: &Url, path_and_query: &str) -> Result<NodeResponse, String> {
        let url = endpoints::resolve(base, path_and_query)
            .map_err(|error| format!("invalid request URL: {error}"))?;

        debug!("GET {url}");

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| error.to_string())?;

        let status = response.status();

        if status.is_server_error() {
            return Err(format!("{url} responded with {status}"));
        }

        let body = response.text().await.map_err(|error| error.to_string())?;

        Ok(NodeResponse { url, status, body })
    }
}

/// A response that was received in full. Server errors never get this far.
#[derive(Debug)]
pub struct NodeResponse {
    url: Url,
    status: StatusCode,
    body: String,
}

impl NodeResponse {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// Whether the body is blank or JSON `null`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let body = self.body.trim();
        body.is_empty() || body == "null"
    }

    /// Fails with [`DataSourceError::Transport`] unless the status is 2xx.
    pub fn ensure_success(self) -> Result<Self, DataSourceError> {
        if self.status.is_success() {
            return Ok(self);
        }

        Err(DataSourceError::Transport {
            message: format!("{} responded with {}: {}", self.url, self.status, self.body),
        })
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DataSourceError> {
        serde_json::from_str(&self.body).map_err(|error| self.malformed(error))
    }

    pub fn malformed(&self, message: impl ToString) -> DataSourceError {
        DataSourceError::MalformedResponse {
            url: self.url.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use httpmock::{Method, MockServer};

    use super::*;

    fn client(urls: impl IntoIterator<Item = Url>) -> BeaconNodeClient {
        BeaconNodeClient::new(Client::new(), urls, DEFAULT_REQUEST_TIMEOUT)
    }

    #[tokio::test]
    async fn no_endpoints_is_an_error() {
        let client = client([]);

        assert_eq!(
            client.get("/beacon/chainhead").await.map(|_| ()),
            Err(DataSourceError::NoEndpointsProvided),
        );
    }

    #[tokio::test]
    async fn server_errors_exhaust_single_endpoint() -> Result<()> {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(Method::GET).path("/beacon/chainhead");
            then.status(500).body("{}");
        });

        let client = client([server.url("/").parse()?]);

        for _ in 0..2 {
            let error = client
                .get("/beacon/chainhead")
                .await
                .expect_err("500 response should be an error");

            assert!(error.is_transport());
        }

        // A failed endpoint is tried again on the next request.
        mock.assert_hits(2);

        Ok(())
    }

    #[tokio::test]
    async fn server_errors_fall_back_to_next_endpoint() -> Result<()> {
        let primary = MockServer::start();
        let fallback = MockServer::start();

        let primary_mock = primary.mock(|when, then| {
            when.method(Method::GET).path("/beacon/chainhead");
            then.status(503);
        });

        let fallback_mock = fallback.mock(|when, then| {
            when.method(Method::GET).path("/beacon/chainhead");
            then.status(200).body(r#"{"headSlot":"1"}"#);
        });

        let client = client([primary.base_url().parse()?, fallback.base_url().parse()?]);
        let response = client.get("/beacon/chainhead").await?;

        assert_eq!(response.status(), StatusCode::OK);

        // The fallback that answered is asked first from now on.
        client.get("/beacon/chainhead").await?;

        primary_mock.assert_hits(1);
        fallback_mock.assert_hits(2);

        Ok(())
    }

    #[tokio::test]
    async fn failing_fallback_wraps_around_to_primary() -> Result<()> {
        let primary = MockServer::start();
        let fallback = MockServer::start();

        let mut primary_down = primary.mock(|when, then| {
            when.method(Method::GET).path("/beacon/chainhead");
            then.status(503);
        });

        let mut fallback_up = fallback.mock(|when, then| {
            when.method(Method::GET).path("/beacon/chainhead");
            then.status(200);
        });

        let client = client([primary.base_url().parse()?, fallback.base_url().parse()?]);

        client.get("/beacon/chainhead").await?;

        primary_down.delete();
        fallback_up.delete();

        let primary_up = primary.mock(|when, then| {
            when.method(Method::GET).path("/beacon/chainhead");
            then.status(200);
        });

        let fallback_down = fallback.mock(|when, then| {
            when.method(Method::GET).path("/beacon/chainhead");
            then.status(502);
        });

        let response = client.get("/beacon/chainhead").await?;

        assert_eq!(response.status(), StatusCode::OK);
        fallback_down.assert_hits(1);
        primary_up.assert_hits(1);

        Ok(())
    }

    #[tokio::test]
    async fn client_errors_are_returned_without_fallback() -> Result<()> {
        let primary = MockServer::start();
        let fallback = MockServer::start();

        primary.mock(|when, then| {
            when.method(Method::GET).path("/eth/v1/beacon/headers/5");
            then.status(404).body(r#"{"code":404,"message":"not found"}"#);
        });

        let fallback_mock = fallback.mock(|when, then| {
            when.method(Method::GET);
            then.status(200);
        });

        let client = client([primary.base_url().parse()?, fallback.base_url().parse()?]);
        let response = client.get("/eth/v1/beacon/headers/5").await?;

        assert!(response.is_not_found());
        assert!(response.ensure_success().is_err());
        fallback_mock.assert_hits(0);

        Ok(())
    }
}
