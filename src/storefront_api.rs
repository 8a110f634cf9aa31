// Typed HTTP client for the storefront server's JSON endpoints.
// Used by the search result aggregator, the autocomplete controller and the admin editor.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::admin::CarEditForm;
use crate::autocomplete::SuggestionSource;
use crate::config::ClientSettings;
use crate::error::ClientError;
use crate::models::{BrandGroup, CarRecord, PopularBrand, SearchFilters, SearchResultPage, Suggestion};
use crate::query_codec;
use crate::search_results::SearchBackend;

#[derive(Clone)]
pub struct StorefrontClient {
    http: Arc<Client>,
    base_url: String,
}

impl StorefrontClient {
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("car_storefront/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build storefront HTTP client")?;
        Ok(Self::with_client(Arc::new(http), &settings.base_url))
    }

    /// Shares an existing client (connection pool) with other callers.
    pub fn with_client(http: Arc<Client>, base_url: &str) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // Non-2xx responses become ClientError::Status, carrying the server's {"error": ...} message if any
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or(body);
            tracing::debug!(status = %status, message = %message, "Storefront API returned an error status");
            return Err(ClientError::Status { status: status.as_u16(), message });
        }
        Ok(response.json::<T>().await?)
    }

    pub async fn search(&self, filters: &SearchFilters, page: u32) -> Result<SearchResultPage, ClientError> {
        let url = self.url(&format!("/search?{}", query_codec::serialize(filters, page)));
        tracing::debug!(url = %url, "GET search");
        let response = self.http.get(&url).send().await?;
        Self::read_json(response).await
    }

    pub async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ClientError> {
        let response = self.http.get(self.url("/suggestions")).query(&[("query", query)]).send().await?;
        Self::read_json(response).await
    }

    pub async fn brands(&self) -> Result<BTreeMap<String, BrandGroup>, ClientError> {
        let response = self.http.get(self.url("/brands")).send().await?;
        Self::read_json(response).await
    }

    pub async fn popular_brands(&self) -> Result<Vec<PopularBrand>, ClientError> {
        let response = self.http.get(self.url("/brands/popular")).send().await?;
        Self::read_json(response).await
    }

    pub async fn get_car(&self, id: i64) -> Result<CarRecord, ClientError> {
        let response = self.http.get(self.url(&format!("/api/car/{id}"))).send().await?;
        Self::read_json(response).await
    }

    /// Validates the form locally and only then submits it. A malformed form never reaches the server.
    pub async fn update_car(&self, id: i64, form: &CarEditForm) -> Result<CarRecord, ClientError> {
        let record = form.validate().inspect_err(|errors| {
            tracing::info!(car_id = id, error = %errors, "Car edit blocked by validation");
        })?;
        let response = self.http.put(self.url(&format!("/api/car/{id}"))).json(&record).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl SearchBackend for StorefrontClient {
    async fn search(&self, filters: &SearchFilters, page: u32) -> Result<SearchResultPage, ClientError> {
        StorefrontClient::search(self, filters, page).await
    }
}

#[async_trait]
impl SuggestionSource for StorefrontClient {
    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ClientError> {
        StorefrontClient::suggestions(self, query).await
    }
}
