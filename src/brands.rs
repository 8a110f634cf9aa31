// Brand listing: per-brand car counts grouped by country group.
// Computed from the current inventory on every request, never cached.

use std::collections::{BTreeMap, HashMap};

use crate::models::{BrandGroup, BrandRecord, BrandSummary, PopularBrand};

/// Left join of the brand registry with inventory brand codes.
/// Matching is case-insensitive on the brand slug; brands without cars get a count of 0.
pub fn summarize_brands<'a, I>(brands: &[BrandRecord], car_brands: I) -> Vec<BrandSummary>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, u64> = HashMap::new();
    for code in car_brands {
        *counts.entry(code.to_lowercase()).or_default() += 1;
    }

    brands
        .iter()
        .map(|brand| BrandSummary {
            name: brand.name.clone(),
            slug: brand.slug.clone(),
            country_group: brand.country_group.clone(),
            car_count: counts.get(&brand.slug.to_lowercase()).copied().unwrap_or(0),
            image_ref: brand.image.clone(),
        })
        .collect()
}

/// Buckets summaries by lower-cased country group.
///
/// The group title keeps the casing of the first summary seen for that group, with
/// only its first character upper-cased ("south korean" becomes "South korean").
/// Brands inside a group are ordered by name, case-insensitively.
pub fn group_by_country(summaries: Vec<BrandSummary>) -> BTreeMap<String, BrandGroup> {
    let mut groups: BTreeMap<String, BrandGroup> = BTreeMap::new();
    for summary in summaries {
        let key = summary.country_group.to_lowercase();
        groups
            .entry(key)
            .or_insert_with(|| BrandGroup { title: capitalize_first(&summary.country_group), brands: Vec::new() })
            .brands
            .push(summary);
    }

    for group in groups.values_mut() {
        group
            .brands
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.slug.cmp(&b.slug)));
    }
    groups
}

/// Brands with at least one car, most cars first.
pub fn popular_brands(summaries: &[BrandSummary], limit: usize) -> Vec<PopularBrand> {
    let mut popular: Vec<PopularBrand> = summaries
        .iter()
        .filter(|s| s.car_count > 0)
        .map(|s| PopularBrand { name: s.name.clone(), slug: s.slug.clone(), count: s.car_count })
        .collect();
    popular.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    popular.truncate(limit);
    popular
}

fn capitalize_first(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
