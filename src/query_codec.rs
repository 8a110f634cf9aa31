//! Mapping between [`SearchFilters`] and the URL query string of a search page.
//!
//! The same codec builds the `GET /search` request on the client and decodes it on
//! the server, so both sides agree on parameter names and defaults.

use crate::models::{Condition, SearchFilters, TagSet};
use url::form_urlencoded;

pub const KEY_CONDITION: &str = "condition";
pub const KEY_ORIGIN: &str = "origin";
pub const KEY_BODY_TYPE: &str = "bodyType";
pub const KEY_ENGINE_TYPE: &str = "engineType";
pub const KEY_DRIVETRAIN: &str = "drivetrain";
pub const KEY_PRICE_FROM: &str = "priceFrom";
pub const KEY_PRICE_TO: &str = "priceTo";
pub const KEY_SEARCH_TERM: &str = "searchTerm";
pub const KEY_PAGE: &str = "page";

/// Filters plus the page decoded from a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub filters: SearchFilters,
    pub page: u32,
}

/// Serializes `filters` and `page` into a query string (without the leading `?`).
///
/// Only constraining fields are emitted. Tag sets become repeated parameters in
/// insertion order; `page` is always present and at least 1.
pub fn serialize(filters: &SearchFilters, page: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());

    if filters.condition() != Condition::All {
        query.append_pair(KEY_CONDITION, filters.condition().as_str());
    }

    let tag_fields: [(&str, &TagSet); 4] = [
        (KEY_ORIGIN, filters.origin()),
        (KEY_BODY_TYPE, filters.body_type()),
        (KEY_ENGINE_TYPE, filters.engine_type()),
        (KEY_DRIVETRAIN, filters.drivetrain()),
    ];
    for (key, tags) in tag_fields {
        for tag in tags.iter() {
            query.append_pair(key, tag);
        }
    }

    for (key, value) in [(KEY_PRICE_FROM, filters.price_from()), (KEY_PRICE_TO, filters.price_to())] {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            query.append_pair(key, &v.to_string());
        }
    }

    if let Some(term) = filters.search_term().filter(|t| !t.is_empty()) {
        query.append_pair(KEY_SEARCH_TERM, term);
    }

    query.append_pair(KEY_PAGE, &page.max(1).to_string());
    query.finish()
}

/// Parses a query string. Never fails: malformed values fall back to the field's default.
pub fn parse(query: &str) -> ParsedQuery {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut filters = SearchFilters::new();
    let mut condition: Option<String> = None;
    let mut price_from: Option<String> = None;
    let mut price_to: Option<String> = None;
    let mut search_term: Option<String> = None;
    let mut page: Option<String> = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            // Scalars: first occurrence wins
            KEY_CONDITION => first(&mut condition, value.into_owned()),
            KEY_PRICE_FROM => first(&mut price_from, value.into_owned()),
            KEY_PRICE_TO => first(&mut price_to, value.into_owned()),
            KEY_SEARCH_TERM => first(&mut search_term, value.into_owned()),
            KEY_PAGE => first(&mut page, value.into_owned()),
            // Sets: every occurrence
            KEY_ORIGIN => {
                filters.origin_mut().insert(value.into_owned());
            }
            KEY_BODY_TYPE => {
                filters.body_type_mut().insert(value.into_owned());
            }
            KEY_ENGINE_TYPE => {
                filters.engine_type_mut().insert(value.into_owned());
            }
            KEY_DRIVETRAIN => {
                filters.drivetrain_mut().insert(value.into_owned());
            }
            other => tracing::trace!(key = other, "Ignoring unknown search parameter"),
        }
    }

    filters.set_condition(condition.as_deref().and_then(Condition::parse).unwrap_or_default());
    filters.set_price_from(price_from.as_deref().and_then(parse_number));
    filters.set_price_to(price_to.as_deref().and_then(parse_number));
    filters.set_search_term(search_term.as_deref());

    let page = page
        .as_deref()
        .and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);

    ParsedQuery { filters, page }
}

fn first(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_filters() -> SearchFilters {
        SearchFilters::new()
            .with_condition(Condition::Used)
            .with_origin(["china", "germany"])
            .with_body_type(["suv"])
            .with_engine_type(["electric", "hybrid"])
            .with_drivetrain(["awd"])
            .with_price_range(Some(15_000.0), Some(42_500.5))
            .with_search_term("zeekr 001 & co")
    }

    #[test]
    fn round_trips_filters_and_page() {
        let samples = [
            (SearchFilters::new(), 1),
            (full_filters(), 3),
            (SearchFilters::new().with_search_term("a+b=c?"), 2),
            (SearchFilters::new().with_price_range(Some(0.0), None), 1),
            (SearchFilters::new().with_origin(["south korea", "日本"]), 7),
        ];
        for (filters, page) in samples {
            let parsed = parse(&serialize(&filters, page));
            assert_eq!(parsed.filters, filters);
            assert_eq!(parsed.page, page);
        }
    }

    #[test]
    fn default_filters_emit_only_page() {
        assert_eq!(serialize(&SearchFilters::new(), 1), "page=1");
        // page is clamped to 1
        assert_eq!(serialize(&SearchFilters::new(), 0), "page=1");
    }

    #[test]
    fn repeated_keys_follow_insertion_order() {
        let filters = SearchFilters::new().with_body_type(["suv", "coupe"]).with_condition(Condition::New);
        assert_eq!(
            serialize(&filters, 2),
            "condition=new&bodyType=suv&bodyType=coupe&page=2"
        );
    }

    #[test]
    fn parse_degrades_to_defaults_on_malformed_input() {
        let parsed = parse("?condition=broken&priceFrom=abc&priceTo=-3&page=zero&searchTerm=%20%20&bogus=1&origin=");
        assert!(parsed.filters.is_unconstrained());
        assert_eq!(parsed.page, 1);

        let parsed = parse("%%%&&==&page=0");
        assert!(parsed.filters.is_unconstrained());
        assert_eq!(parsed.page, 1);
    }

    #[test]
    fn scalar_keys_take_first_occurrence_and_sets_deduplicate() {
        let parsed = parse("searchTerm=first&searchTerm=second&origin=china&origin=china&origin=japan&priceTo=10&priceTo=20");
        assert_eq!(parsed.filters.search_term(), Some("first"));
        assert_eq!(parsed.filters.origin().iter().collect::<Vec<_>>(), vec!["china", "japan"]);
        assert_eq!(parsed.filters.price_to(), Some(10.0));
    }
}
