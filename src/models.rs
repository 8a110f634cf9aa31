// Data structures shared by the server, the storefront client and the inventory stores.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// --- Search filters ---

/// Condition filter. `All` is the default and never constrains a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[default]
    All,
    New,
    Used,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::All => "all",
            Condition::New => "new",
            Condition::Used => "used",
        }
    }

    /// Lenient parse used by the query codec. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Condition::All),
            "new" => Some(Condition::New),
            "used" => Some(Condition::Used),
            _ => None,
        }
    }

    /// The car condition this filter requires, if any.
    pub fn required(&self) -> Option<CarCondition> {
        match self {
            Condition::All => None,
            Condition::New => Some(CarCondition::New),
            Condition::Used => Some(CarCondition::Used),
        }
    }
}

/// Ordered set of filter tags. Insertion order is kept; empty tags and duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the tag was empty or already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if tag.is_empty() || self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Empty set means "no constraint".
    pub fn admits(&self, value: &str) -> bool {
        let value = value.to_lowercase();
        self.is_empty() || self.0.iter().any(|t| t.to_lowercase() == value)
    }

    /// Lower-cased tags, as bound into SQL.
    pub fn lowercased(&self) -> Vec<String> {
        self.0.iter().map(|t| t.to_lowercase()).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// The canonical filter state of a search.
///
/// Fields are private so every value is normalized on the way in: blank search
/// terms and negative or non-finite prices never make it into the struct. That keeps
/// `query_codec::parse(query_codec::serialize(f))` equal to `f` for any reachable `f`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    condition: Condition,
    origin: TagSet,
    body_type: TagSet,
    engine_type: TagSet,
    drivetrain: TagSet,
    price_from: Option<f64>,
    price_to: Option<f64>,
    search_term: Option<String>,
}

fn normalize_price(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn origin(&self) -> &TagSet {
        &self.origin
    }

    pub fn body_type(&self) -> &TagSet {
        &self.body_type
    }

    pub fn engine_type(&self) -> &TagSet {
        &self.engine_type
    }

    pub fn drivetrain(&self) -> &TagSet {
        &self.drivetrain
    }

    pub fn price_from(&self) -> Option<f64> {
        self.price_from
    }

    pub fn price_to(&self) -> Option<f64> {
        self.price_to
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_term.as_deref()
    }

    pub fn origin_mut(&mut self) -> &mut TagSet {
        &mut self.origin
    }

    pub fn body_type_mut(&mut self) -> &mut TagSet {
        &mut self.body_type
    }

    pub fn engine_type_mut(&mut self) -> &mut TagSet {
        &mut self.engine_type
    }

    pub fn drivetrain_mut(&mut self) -> &mut TagSet {
        &mut self.drivetrain
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
    }

    pub fn set_price_from(&mut self, value: Option<f64>) {
        self.price_from = normalize_price(value);
    }

    pub fn set_price_to(&mut self, value: Option<f64>) {
        self.price_to = normalize_price(value);
    }

    /// Stores the trimmed term; blank input clears it.
    pub fn set_search_term(&mut self, term: Option<&str>) {
        self.search_term = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
    }

    // Builder-style helpers, mostly for call sites that assemble a filter set in one go.

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.set_condition(condition);
        self
    }

    pub fn with_origin<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origin = tags.into_iter().collect();
        self
    }

    pub fn with_body_type<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body_type = tags.into_iter().collect();
        self
    }

    pub fn with_engine_type<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engine_type = tags.into_iter().collect();
        self
    }

    pub fn with_drivetrain<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drivetrain = tags.into_iter().collect();
        self
    }

    pub fn with_price_range(mut self, from: Option<f64>, to: Option<f64>) -> Self {
        self.set_price_from(from);
        self.set_price_to(to);
        self
    }

    pub fn with_search_term(mut self, term: &str) -> Self {
        self.set_search_term(Some(term));
        self
    }

    /// True when no field constrains the search.
    pub fn is_unconstrained(&self) -> bool {
        *self == SearchFilters::default()
    }

    /// In-process evaluation of the filter set against one car.
    /// Mirrors the SQL built by `inventory::postgres::push_filters`.
    pub fn matches(&self, car: &CarSummary) -> bool {
        if let Some(required) = self.condition.required() {
            if car.condition != required {
                return false;
            }
        }
        if !self.origin.admits(&car.origin)
            || !self.body_type.admits(&car.body_type)
            || !self.engine_type.admits(&car.engine_type)
            || !self.drivetrain.admits(&car.drivetrain)
        {
            return false;
        }
        if self.price_from.is_some_and(|from| car.price < from) {
            return false;
        }
        if self.price_to.is_some_and(|to| car.price > to) {
            return false;
        }
        match &self.search_term {
            Some(term) => {
                let needle = term.to_lowercase();
                [car.brand.as_str(), car.model.as_str(), car.name.as_str()]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
                    || car.id.to_string().contains(&needle)
            }
            None => true,
        }
    }
}

// --- Cars ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarCondition {
    New,
    Used,
}

impl CarCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarCondition::New => "new",
            CarCondition::Used => "used",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(CarCondition::New),
            "used" => Some(CarCondition::Used),
            _ => None,
        }
    }
}

// A car as shown on listing and search result cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSummary {
    pub id: i64,
    pub brand: String, // Brand code, joined case-insensitively against the brand slug
    pub model: String,
    pub name: String,
    pub price: f64,
    pub year: Option<i32>,
    pub condition: CarCondition,
    pub origin: String,
    pub body_type: String,
    pub engine_type: String,
    pub drivetrain: String,
    pub image: Option<String>,
}

/// A named extra with an optional price (options, accessories).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

// Full record edited through the admin panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    #[serde(flatten)]
    pub summary: CarSummary,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub options: Vec<PricedItem>,
    #[serde(default)]
    pub characteristics: BTreeMap<String, Value>,
    #[serde(default)]
    pub accessories: Vec<PricedItem>,
    #[serde(default)]
    pub colors: Vec<ColorSwatch>,
    #[serde(default)]
    pub specs: BTreeMap<String, Value>,
}

// --- Search responses ---

// One page of search results; total_count covers every page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultPage {
    pub cars: Vec<CarSummary>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub value: String,
}

// --- Brands ---

// Row of the brand registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandRecord {
    pub name: String,
    pub slug: String,
    pub country_group: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandSummary {
    pub name: String,
    pub slug: String,
    pub country_group: String,
    pub car_count: u64,
    pub image_ref: Option<String>,
}

// Brands sharing a country group, e.g. "Chinese"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandGroup {
    pub title: String,
    pub brands: Vec<BrandSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularBrand {
    pub name: String,
    pub slug: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{car, record};

    #[test]
    fn tag_set_keeps_insertion_order_and_drops_duplicates() {
        let tags: TagSet = ["suv", "sedan", "", "suv", "coupe"].into_iter().collect();
        assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["suv", "sedan", "coupe"]);
    }

    #[test]
    fn setters_normalize_unreachable_values() {
        let mut filters = SearchFilters::new();
        filters.set_search_term(Some("   "));
        filters.set_price_from(Some(-5.0));
        filters.set_price_to(Some(f64::NAN));
        assert!(filters.is_unconstrained());

        filters.set_search_term(Some("  zeekr 001 "));
        assert_eq!(filters.search_term(), Some("zeekr 001"));
    }

    #[test]
    fn matches_applies_every_constraint() {
        let car = car(7, "Zeekr", "001");
        assert!(SearchFilters::new().matches(&car));
        assert!(SearchFilters::new().with_origin(["China"]).matches(&car));
        assert!(!SearchFilters::new().with_condition(Condition::Used).matches(&car));
        assert!(!SearchFilters::new().with_body_type(["sedan"]).matches(&car));
        assert!(!SearchFilters::new().with_price_range(Some(40_000.0), None).matches(&car));
        assert!(SearchFilters::new().with_price_range(None, Some(30_000.0)).matches(&car));
        assert!(SearchFilters::new().with_search_term("zEEk").matches(&car));
        assert!(SearchFilters::new().with_search_term("7").matches(&car));
        assert!(!SearchFilters::new().with_search_term("tesla").matches(&car));
    }

    #[test]
    fn car_record_json_flattens_summary() {
        let mut record = record(1, "BYD", "Seal");
        record.images = vec!["a.jpg".to_string()];
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["bodyType"], "suv");
        assert_eq!(json["images"][0], "a.jpg");
        let back: CarRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
