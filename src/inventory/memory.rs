// In-memory inventory, used by tests and by database-less demo runs.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::{fs, path::Path};
use tokio::sync::RwLock;

use super::Inventory;
use crate::brands;
use crate::models::{BrandRecord, BrandSummary, CarRecord, SearchFilters, SearchResultPage, Suggestion};

/// Seed file layout: `{ "brands": [...], "cars": [...] }`.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub brands: Vec<BrandRecord>,
    #[serde(default)]
    pub cars: Vec<CarRecord>,
}

#[derive(Default)]
pub struct MemoryInventory {
    brands: Vec<BrandRecord>,
    cars: RwLock<Vec<CarRecord>>,
}

impl MemoryInventory {
    pub fn new(brands: Vec<BrandRecord>, mut cars: Vec<CarRecord>) -> Self {
        cars.sort_by_key(|c| c.summary.id);
        Self { brands, cars: RwLock::new(cars) }
    }

    pub fn from_seed(seed: Seed) -> Self {
        Self::new(seed.brands, seed.cars)
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: Seed = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;
        tracing::debug!(brands = seed.brands.len(), cars = seed.cars.len(), "Loaded inventory seed");
        Ok(Self::from_seed(seed))
    }
}

#[async_trait]
impl Inventory for MemoryInventory {
    async fn search(&self, filters: &SearchFilters, page: u32, page_size: u32) -> Result<SearchResultPage> {
        let cars = self.cars.read().await;
        let matching: Vec<_> = cars.iter().map(|c| &c.summary).filter(|c| filters.matches(c)).collect();
        let offset = (page.max(1) as usize - 1) * page_size as usize;
        Ok(SearchResultPage {
            total_count: matching.len() as u64,
            cars: matching.into_iter().skip(offset).take(page_size as usize).cloned().collect(),
        })
    }

    async fn suggestions(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let needle = query.trim().to_lowercase();
        let cars = self.cars.read().await;

        // BTreeSet keyed on the lower-cased label: sorted and de-duplicated
        let mut brand_labels = BTreeSet::new();
        let mut model_labels = BTreeSet::new();
        for car in cars.iter().map(|c| &c.summary) {
            if car.brand.to_lowercase().contains(&needle) {
                brand_labels.insert((car.brand.to_lowercase(), car.brand.clone()));
            }
            let pair = format!("{} {}", car.brand, car.model);
            if pair.to_lowercase().contains(&needle) {
                model_labels.insert((pair.to_lowercase(), pair));
            }
        }

        Ok(brand_labels
            .into_iter()
            .chain(model_labels)
            .map(|(_, label)| Suggestion { value: label.clone(), label })
            .take(limit)
            .collect())
    }

    async fn brand_summaries(&self) -> Result<Vec<BrandSummary>> {
        let cars = self.cars.read().await;
        Ok(brands::summarize_brands(&self.brands, cars.iter().map(|c| c.summary.brand.as_str())))
    }

    async fn get_car(&self, id: i64) -> Result<Option<CarRecord>> {
        let cars = self.cars.read().await;
        Ok(cars.iter().find(|c| c.summary.id == id).cloned())
    }

    async fn update_car(&self, record: CarRecord) -> Result<Option<CarRecord>> {
        let mut cars = self.cars.write().await;
        match cars.iter_mut().find(|c| c.summary.id == record.summary.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }
}
