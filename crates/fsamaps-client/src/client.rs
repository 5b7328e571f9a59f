//! HTTP client for the Business Query Service REST API.
//!
//! Wraps `reqwest` with FSA-Maps-specific URL building, error mapping, and
//! typed response deserialization. Non-2xx responses surface as
//! [`ClientError::Status`] carrying the server's `detail` message when one
//! was sent, or the status code otherwise.

use std::time::Duration;

use fsamaps_core::{
    ApiStatus, Business, HealthStatus, Metadata, MetadataHistoryEntry, SearchQuery, ViewportQuery,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Client for the Business Query Service.
///
/// Use [`FsaClient::new`] with the API root (for example
/// `http://localhost:8000/api`); every endpoint path is resolved relative to
/// it, so tests can point it at a mock server.
#[derive(Debug, Clone)]
pub struct FsaClient {
    client: Client,
    base_url: Url,
}

impl FsaClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute URL.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash, so `Url::join` appends to the API root
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the businesses inside the query's bounding box.
    ///
    /// The `ratings` parameter is only sent when at least one rating filter
    /// is selected.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] on a non-2xx response.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the body is not a list of businesses.
    pub async fn businesses_in_viewport(
        &self,
        query: &ViewportQuery,
    ) -> Result<Vec<Business>, ClientError> {
        let url = self.viewport_url(query)?;
        self.get_json(url, "businesses").await
    }

    /// Searches businesses by name, location fragment, and rating filters.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] on a non-2xx response.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the body is not a list of businesses.
    pub async fn search_businesses(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<Business>, ClientError> {
        let url = self.search_url(query)?;
        self.get_json(url, "businesses/search").await
    }

    /// Fetches provenance of the dataset currently being served.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Status`] on a non-2xx response, e.g. 404 with
    ///   `"No metadata available."` before the first import.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the response shape is unexpected.
    pub async fn metadata(&self) -> Result<Metadata, ClientError> {
        let url = self.build_url("metadata", &[])?;
        self.get_json(url, "metadata").await
    }

    /// Lists past imports, newest first.
    ///
    /// # Errors
    ///
    /// Same as [`FsaClient::metadata`].
    pub async fn metadata_history(
        &self,
        limit: u32,
    ) -> Result<Vec<MetadataHistoryEntry>, ClientError> {
        let limit = limit.to_string();
        let url = self.build_url("metadata/history", &[("limit", limit.as_str())])?;
        self.get_json(url, "metadata/history").await
    }

    /// # Errors
    ///
    /// Any non-2xx status or transport failure; callers treat all of them as
    /// the API being unavailable.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = self.build_url("health", &[])?;
        self.get_json(url, "health").await
    }

    /// Health check folded into what a status indicator displays.
    pub async fn api_status(&self) -> ApiStatus {
        match self.health().await {
            Ok(health) => ApiStatus::Available(health.status),
            Err(error) => {
                tracing::warn!(%error, "health check failed");
                ApiStatus::Unavailable
            }
        }
    }

    fn viewport_url(&self, query: &ViewportQuery) -> Result<Url, ClientError> {
        let bounds = query.bounds;
        let min_lat = bounds.south.to_string();
        let max_lat = bounds.north.to_string();
        let min_lng = bounds.west.to_string();
        let max_lng = bounds.east.to_string();
        let ratings = query.ratings.to_query_value();

        let mut params = vec![
            ("min_lat", min_lat.as_str()),
            ("max_lat", max_lat.as_str()),
            ("min_lng", min_lng.as_str()),
            ("max_lng", max_lng.as_str()),
        ];
        if let Some(ratings) = &ratings {
            params.push(("ratings", ratings.as_str()));
        }
        self.build_url("businesses", &params)
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url, ClientError> {
        let ratings = query.ratings.to_query_value();

        let mut params = Vec::new();
        if let Some(name) = query.name() {
            params.push(("name", name));
        }
        if let Some(location) = query.location() {
            params.push(("location", location));
        }
        if let Some(ratings) = &ratings {
            params.push(("ratings", ratings.as_str()));
        }
        self.build_url("businesses/search", &params)
    }

    /// Resolves `path` against the API root and appends percent-encoded
    /// query parameters.
    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends a GET request and deserializes a 2xx body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] for a non-2xx status,
    /// [`ClientError::Http`] on network failure, and
    /// [`ClientError::Deserialize`] if the body does not match `T`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, ClientError> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Builds the error for a non-2xx response, preferring a string `detail`
/// field from a JSON body over the bare status code.
fn status_error(status: u16, body: &str) -> ClientError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .filter(|d| !d.trim().is_empty());

    ClientError::Status {
        status,
        message: detail.unwrap_or_else(|| status.to_string()),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
