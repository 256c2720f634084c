//! HTTP client returning status + body, with 404 as a recognized outcome.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::PackageError;

/// Raw result of a GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND.as_u16()
    }

    /// Turn a non-success status into [`PackageError::Transport`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PackageError::Transport {
                url: self.url,
                status: self.status,
            }
            .into())
        }
    }
}

/// Thin wrapper over a configured reqwest `Client`.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and returns whatever the server answered.
    /// Only connection-level failures are errors here.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?
            .to_vec();

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchResponse {
            url: url.to_string(),
            status,
            body,
        })
    }

    /// GET that maps 404 to `None` and any other failure status to an error.
    #[tracing::instrument(skip(self))]
    pub async fn get_optional(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = self.fetch(url).await?;
        if response.is_not_found() {
            debug!("{} not found", url);
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.body))
    }

    /// GET that requires a successful response.
    #[tracing::instrument(skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.fetch(url).await?.error_for_status()?.body)
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_bytes(url).await?;
        serde_json::from_slice(&body)
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }
}
