// Nexus REST API client: authenticated GET + JSON decode, plus typed endpoint wrappers.

mod pagination;

pub use pagination::{Collected, collect_pages};

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use crate::config::Credentials;
use crate::error::CollectError;
use crate::models::{Asset, AssetPage, BlobstoreCapacity, BlobstoreSummary, Repository, coerce};

const API_PREFIX: [&str; 3] = ["service", "rest", "v1"];

pub struct NexusClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
}

impl NexusClient {
    /// Every request carries `timeout`; a timed-out request is a transport error.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, CollectError> {
        let base = Url::parse(&credentials.base_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| CollectError::InvalidUrl(credentials.base_url.clone()))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CollectError::Client)?;
        Ok(Self {
            http,
            base,
            username: credentials.username,
            password: credentials.password,
        })
    }

    /// `{base}/service/rest/v1/{segments...}`, each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(API_PREFIX).extend(segments);
        }
        url
    }

    /// One authenticated GET, body decoded as JSON into `T`. No retry.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, CollectError> {
        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .query(query)
            .send()
            .await
            .map_err(|source| CollectError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| CollectError::Transport {
                url: url.to_string(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| CollectError::Decode {
            url: url.to_string(),
            source,
        })
    }

    #[instrument(skip(self), fields(operation = "list_repositories"))]
    pub async fn list_repositories(&self) -> Result<Vec<Repository>, CollectError> {
        let raw: Vec<Value> = self.fetch_json(self.api_url(&["repositories"]), &[]).await?;
        Ok(coerce::lenient_items(raw))
    }

    #[instrument(skip(self), fields(operation = "list_blobstores"))]
    pub async fn list_blobstores(&self) -> Result<Vec<BlobstoreSummary>, CollectError> {
        let raw: Vec<Value> = self.fetch_json(self.api_url(&["blobstores"]), &[]).await?;
        Ok(coerce::lenient_items(raw))
    }

    #[instrument(skip(self), fields(operation = "blobstore_capacity"))]
    pub async fn blobstore_capacity(&self, name: &str) -> Result<BlobstoreCapacity, CollectError> {
        self.fetch_json(self.api_url(&["blobstores", name, "capacity"]), &[])
            .await
    }

    #[instrument(skip(self), fields(operation = "search_assets_page"))]
    pub async fn search_assets_page(
        &self,
        continuation_token: Option<&str>,
    ) -> Result<AssetPage, CollectError> {
        let query: Vec<(&str, &str)> = continuation_token
            .map(|t| vec![("continuationToken", t)])
            .unwrap_or_default();
        self.fetch_json(self.api_url(&["search", "assets"]), &query)
            .await
    }

    /// Walks `search/assets` until the continuation token runs out.
    #[instrument(skip(self), fields(operation = "collect_assets"))]
    pub async fn collect_all_assets(&self) -> Result<Collected<Asset>, CollectError> {
        collect_pages(|token| async move { self.search_assets_page(token.as_deref()).await }).await
    }
}
