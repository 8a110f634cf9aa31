// Storage behind the HTTP handlers: cars and the brand registry.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Settings;
use crate::models::{BrandSummary, CarRecord, SearchFilters, SearchResultPage, Suggestion};

mod memory;
mod postgres;

pub use memory::{MemoryInventory, Seed};
pub use postgres::PgInventory;

#[async_trait]
pub trait Inventory: Send + Sync {
    /// One page (1-based) of cars matching `filters`, ordered by id, plus the total match count.
    async fn search(&self, filters: &SearchFilters, page: u32, page_size: u32) -> Result<SearchResultPage>;

    /// Brand names, then "brand model" pairs, containing `query` (case-insensitive).
    async fn suggestions(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>>;

    /// Every registered brand with its current car count (zero included).
    async fn brand_summaries(&self) -> Result<Vec<BrandSummary>>;

    async fn get_car(&self, id: i64) -> Result<Option<CarRecord>>;

    /// Replaces the stored record. `None` when no car has that id.
    async fn update_car(&self, record: CarRecord) -> Result<Option<CarRecord>>;
}

/// Picks the store from configuration: Postgres when a database URL is set,
/// otherwise the in-memory store (seeded from `seed_file` when given).
pub async fn connect(settings: &Settings) -> Result<Arc<dyn Inventory>> {
    if let Some(url) = settings.database_url.as_deref() {
        let store = PgInventory::connect(url, settings.db_max_connections)
            .await
            .context("Failed to connect to the inventory database")?;
        if settings.run_migrations {
            store.migrate().await?;
        }
        tracing::info!("Using Postgres inventory.");
        return Ok(Arc::new(store));
    }

    match settings.seed_file.as_deref() {
        Some(path) => {
            let store = MemoryInventory::from_seed_file(path)?;
            tracing::info!("Using in-memory inventory seeded from {}", path);
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("No database_url or seed_file configured; starting with an empty inventory.");
            Ok(Arc::new(MemoryInventory::default()))
        }
    }
}
