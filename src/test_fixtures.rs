// Shared builders for unit tests

use std::collections::BTreeMap;

use crate::models::{BrandRecord, CarCondition, CarRecord, CarSummary};

pub(crate) fn car(id: i64, brand: &str, model: &str) -> CarSummary {
    CarSummary {
        id,
        brand: brand.to_string(),
        model: model.to_string(),
        name: format!("{brand} {model}"),
        price: 30_000.0,
        year: Some(2023),
        condition: CarCondition::New,
        origin: "china".to_string(),
        body_type: "suv".to_string(),
        engine_type: "electric".to_string(),
        drivetrain: "awd".to_string(),
        image: None,
    }
}

pub(crate) fn record(id: i64, brand: &str, model: &str) -> CarRecord {
    CarRecord {
        summary: car(id, brand, model),
        description: None,
        images: Vec::new(),
        options: Vec::new(),
        characteristics: BTreeMap::new(),
        accessories: Vec::new(),
        colors: Vec::new(),
        specs: BTreeMap::new(),
    }
}

pub(crate) fn brand(name: &str, slug: &str, country_group: &str) -> BrandRecord {
    BrandRecord {
        name: name.to_string(),
        slug: slug.to_string(),
        country_group: country_group.to_string(),
        image: Some(format!("/static/brands/{slug}.svg")),
    }
}
