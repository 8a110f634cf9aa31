// Postgres inventory: translates search filters into bound SQL parameters.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::collections::BTreeMap;

use super::Inventory;
use crate::models::{
    BrandSummary, CarCondition, CarRecord, CarSummary, ColorSwatch, PricedItem, SearchFilters, SearchResultPage,
    Suggestion, TagSet,
};

const SUMMARY_COLUMNS: &str =
    "id, brand, model, name, price, year, condition, origin, body_type, engine_type, drivetrain, image";
const RECORD_COLUMNS: &str = "id, brand, model, name, price, year, condition, origin, body_type, engine_type, \
     drivetrain, image, description, images, options, characteristics, accessories, colors, specs";

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: i64,
    brand: String,
    model: String,
    name: String,
    price: f64,
    year: Option<i32>,
    condition: String,
    origin: String,
    body_type: String,
    engine_type: String,
    drivetrain: String,
    image: Option<String>,
}

impl TryFrom<SummaryRow> for CarSummary {
    type Error = anyhow::Error;

    fn try_from(row: SummaryRow) -> Result<Self> {
        let condition = CarCondition::parse(&row.condition)
            .ok_or_else(|| anyhow!("Car {} has unknown condition '{}'", row.id, row.condition))?;
        Ok(CarSummary {
            id: row.id,
            brand: row.brand,
            model: row.model,
            name: row.name,
            price: row.price,
            year: row.year,
            condition,
            origin: row.origin,
            body_type: row.body_type,
            engine_type: row.engine_type,
            drivetrain: row.drivetrain,
            image: row.image,
        })
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    #[sqlx(flatten)]
    summary: SummaryRow,
    description: Option<String>,
    images: Json<Vec<String>>,
    options: Json<Vec<PricedItem>>,
    characteristics: Json<BTreeMap<String, Value>>,
    accessories: Json<Vec<PricedItem>>,
    colors: Json<Vec<ColorSwatch>>,
    specs: Json<BTreeMap<String, Value>>,
}

impl TryFrom<RecordRow> for CarRecord {
    type Error = anyhow::Error;

    fn try_from(row: RecordRow) -> Result<Self> {
        Ok(CarRecord {
            summary: row.summary.try_into()?,
            description: row.description,
            images: row.images.0,
            options: row.options.0,
            characteristics: row.characteristics.0,
            accessories: row.accessories.0,
            colors: row.colors.0,
            specs: row.specs.0,
        })
    }
}

#[derive(Debug, FromRow)]
struct BrandCountRow {
    name: String,
    slug: String,
    country_group: String,
    image: Option<String>,
    car_count: i64,
}

pub struct PgInventory {
    pool: PgPool,
}

impl PgInventory {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("Failed to open Postgres connection pool")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running inventory migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run inventory migrations")?;
        Ok(())
    }
}

/// Escapes LIKE wildcards and wraps the term for a "contains" match.
fn contains_pattern(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_tags(query: &mut QueryBuilder<'_, Postgres>, column: &str, tags: &TagSet) {
    if tags.is_empty() {
        return;
    }
    query.push(format!(" AND lower({column}) = ANY("));
    query.push_bind(tags.lowercased());
    query.push(")");
}

/// Appends the WHERE clause for `filters`. Every value is a bind parameter.
fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &SearchFilters) {
    query.push(" WHERE TRUE");

    if let Some(condition) = filters.condition().required() {
        query.push(" AND condition = ");
        query.push_bind(condition.as_str());
    }

    push_tags(query, "origin", filters.origin());
    push_tags(query, "body_type", filters.body_type());
    push_tags(query, "engine_type", filters.engine_type());
    push_tags(query, "drivetrain", filters.drivetrain());

    if let Some(from) = filters.price_from() {
        query.push(" AND price >= ");
        query.push_bind(from);
    }
    if let Some(to) = filters.price_to() {
        query.push(" AND price <= ");
        query.push_bind(to);
    }

    if let Some(term) = filters.search_term() {
        let pattern = contains_pattern(term);
        query.push(" AND (brand ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR model ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR CAST(id AS TEXT) ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait]
impl Inventory for PgInventory {
    async fn search(&self, filters: &SearchFilters, page: u32, page_size: u32) -> Result<SearchResultPage> {
        let offset = i64::from(page.max(1) - 1) * i64::from(page_size);

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cars");
        push_filters(&mut count_query, filters);

        let mut page_query = QueryBuilder::<Postgres>::new(format!("SELECT {SUMMARY_COLUMNS} FROM cars"));
        push_filters(&mut page_query, filters);
        page_query.push(" ORDER BY id LIMIT ");
        page_query.push_bind(i64::from(page_size));
        page_query.push(" OFFSET ");
        page_query.push_bind(offset);

        tracing::debug!(sql = page_query.sql(), page, "Running search query");
        let (total, rows) = futures::try_join!(
            count_query.build_query_scalar::<i64>().fetch_one(&self.pool),
            page_query.build_query_as::<SummaryRow>().fetch_all(&self.pool),
        )
        .context("Search query failed")?;

        let cars = rows.into_iter().map(CarSummary::try_from).collect::<Result<Vec<_>>>()?;
        Ok(SearchResultPage { cars, total_count: u64::try_from(total).unwrap_or(0) })
    }

    async fn suggestions(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let pattern = contains_pattern(query.trim());
        let labels: Vec<String> = sqlx::query_scalar(
            "SELECT label FROM (
                 SELECT DISTINCT brand AS label, 0 AS kind FROM cars WHERE brand ILIKE $1
                 UNION
                 SELECT DISTINCT brand || ' ' || model AS label, 1 AS kind FROM cars
                 WHERE (brand || ' ' || model) ILIKE $1
             ) AS s
             ORDER BY kind, lower(label), label
             LIMIT $2",
        )
        .bind(pattern)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Suggestion query failed")?;

        Ok(labels.into_iter().map(|label| Suggestion { value: label.clone(), label }).collect())
    }

    async fn brand_summaries(&self) -> Result<Vec<BrandSummary>> {
        // LEFT JOIN keeps brands that have no cars
        let rows: Vec<BrandCountRow> = sqlx::query_as(
            "SELECT b.name, b.slug, b.country_group, b.image, COUNT(c.id) AS car_count
             FROM brands b
             LEFT JOIN cars c ON lower(c.brand) = lower(b.slug)
             GROUP BY b.name, b.slug, b.country_group, b.image",
        )
        .fetch_all(&self.pool)
        .await
        .context("Brand summary query failed")?;

        Ok(rows
            .into_iter()
            .map(|row| BrandSummary {
                name: row.name,
                slug: row.slug,
                country_group: row.country_group,
                car_count: u64::try_from(row.car_count).unwrap_or(0),
                image_ref: row.image,
            })
            .collect())
    }

    async fn get_car(&self, id: i64) -> Result<Option<CarRecord>> {
        let row: Option<RecordRow> = sqlx::query_as(&format!("SELECT {RECORD_COLUMNS} FROM cars WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load car {id}"))?;
        row.map(CarRecord::try_from).transpose()
    }

    async fn update_car(&self, record: CarRecord) -> Result<Option<CarRecord>> {
        let car = &record.summary;
        let sql = format!(
            "UPDATE cars SET brand = $2, model = $3, name = $4, price = $5, year = $6, condition = $7,
                 origin = $8, body_type = $9, engine_type = $10, drivetrain = $11, image = $12,
                 description = $13, images = $14, options = $15, characteristics = $16,
                 accessories = $17, colors = $18, specs = $19
             WHERE id = $1
             RETURNING {RECORD_COLUMNS}"
        );
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(car.id)
            .bind(&car.brand)
            .bind(&car.model)
            .bind(&car.name)
            .bind(car.price)
            .bind(car.year)
            .bind(car.condition.as_str())
            .bind(&car.origin)
            .bind(&car.body_type)
            .bind(&car.engine_type)
            .bind(&car.drivetrain)
            .bind(&car.image)
            .bind(&record.description)
            .bind(Json(&record.images))
            .bind(Json(&record.options))
            .bind(Json(&record.characteristics))
            .bind(Json(&record.accessories))
            .bind(Json(&record.colors))
            .bind(Json(&record.specs))
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to update car {}", car.id))?;
        row.map(CarRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Condition;

    #[test]
    fn empty_filters_add_no_constraints() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cars");
        push_filters(&mut query, &SearchFilters::new());
        assert_eq!(query.sql(), "SELECT COUNT(*) FROM cars WHERE TRUE");
    }

    #[test]
    fn filters_become_bind_parameters() {
        let filters = SearchFilters::new()
            .with_condition(Condition::New)
            .with_body_type(["SUV", "coupe"])
            .with_price_range(Some(10_000.0), Some(50_000.0))
            .with_search_term("o'neil");
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cars");
        push_filters(&mut query, &filters);

        let sql = query.sql();
        assert!(sql.contains("condition = $1"));
        assert!(sql.contains("lower(body_type) = ANY($2)"));
        assert!(sql.contains("price >= $3 AND price <= $4"));
        assert!(sql.contains("brand ILIKE $5"));
        assert!(sql.contains("CAST(id AS TEXT) ILIKE $8"));
        assert!(!sql.contains("o'neil"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }
}
