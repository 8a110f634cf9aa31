//! Car marketplace storefront: the JSON server over the car inventory, and the
//! client-side search core (query codec, filter store, autocomplete, result paging).

use axum::extract::FromRef;
use std::sync::Arc;

pub mod admin;
pub mod autocomplete;
pub mod brands;
pub mod config;
pub mod error;
pub mod filter_store;
pub mod inventory;
pub mod models;
pub mod query_codec;
pub mod routes;
pub mod search_results;
pub mod storefront_api;

#[cfg(test)]
mod test_fixtures;

use crate::config::Settings;
use crate::inventory::Inventory;

// Shared state handed to every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub inventory: Arc<dyn Inventory>,
}
