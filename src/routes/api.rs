// Handlers for the public storefront endpoints

use axum::{
    extract::{Query, RawQuery, State},
    response::Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::{
    autocomplete::MIN_QUERY_CHARS,
    brands,
    error::AppResult,
    models::{BrandGroup, PopularBrand, SearchResultPage, Suggestion},
    query_codec,
    AppState,
};

#[derive(Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default)]
    query: String,
}

// GET /search?<filters>&page=N
// Decoded with the same codec the client uses, so repeated keys become tag sets.
pub async fn search_cars(
    State(app_state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> AppResult<Json<SearchResultPage>> {
    let parsed = query_codec::parse(raw_query.as_deref().unwrap_or_default());
    tracing::info!("[HANDLER] /search - page {} with filters: {:?}", parsed.page, parsed.filters);

    let page = app_state
        .inventory
        .search(&parsed.filters, parsed.page, app_state.settings.page_size)
        .await?;

    tracing::debug!("[HANDLER] /search - returning {} of {} cars", page.cars.len(), page.total_count);
    Ok(Json(page))
}

pub async fn get_suggestions(
    State(app_state): State<AppState>,
    Query(params): Query<SuggestionsQuery>,
) -> AppResult<Json<Vec<Suggestion>>> {
    let query = params.query.trim();
    if query.chars().count() < MIN_QUERY_CHARS {
        // Too short to be useful; an empty list is a valid answer
        return Ok(Json(Vec::new()));
    }

    tracing::info!("[HANDLER] /suggestions - query: {}", query);
    let suggestions = app_state
        .inventory
        .suggestions(query, app_state.settings.suggestion_limit as usize)
        .await?;
    Ok(Json(suggestions))
}

pub async fn list_brands(State(app_state): State<AppState>) -> AppResult<Json<BTreeMap<String, BrandGroup>>> {
    tracing::info!("[HANDLER] /brands - Request received.");
    let summaries = app_state.inventory.brand_summaries().await?;
    let groups = brands::group_by_country(summaries);
    tracing::debug!("[HANDLER] /brands - {} country groups", groups.len());
    Ok(Json(groups))
}

pub async fn popular_brands(State(app_state): State<AppState>) -> AppResult<Json<Vec<PopularBrand>>> {
    tracing::info!("[HANDLER] /brands/popular - Request received.");
    let summaries = app_state.inventory.brand_summaries().await?;
    Ok(Json(brands::popular_brands(&summaries, app_state.settings.popular_brand_limit as usize)))
}
