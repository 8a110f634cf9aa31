//! Admin edit form for a single car record.
//!
//! The admin panel edits the structured parts of a record (images, options,
//! characteristics, accessories, colors, specs) as raw JSON text. [`CarEditForm::validate`]
//! turns the form into a typed [`CarRecord`] and reports every malformed field; the
//! client refuses to submit until that succeeds.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{CarCondition, CarRecord, CarSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarEditForm {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub name: String,
    pub price: String,
    pub year: String,
    pub condition: String,
    pub origin: String,
    pub body_type: String,
    pub engine_type: String,
    pub drivetrain: String,
    pub image: String,
    pub description: String,
    // JSON text fields
    pub images: String,
    pub options: String,
    pub characteristics: String,
    pub accessories: String,
    pub colors: String,
    pub specs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every problem found in a form, in field order. Display shows the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn first(&self) -> Option<&FieldError> {
        self.0.first()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|e| e.field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.first() {
            Some(e) if self.0.len() > 1 => {
                write!(f, "Invalid {}: {} (and {} more)", e.field, e.message, self.0.len() - 1)
            }
            Some(e) => write!(f, "Invalid {}: {}", e.field, e.message),
            None => write!(f, "Invalid form"),
        }
    }
}

impl std::error::Error for ValidationErrors {}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn optional(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl CarEditForm {
    /// Pre-fills the form from a stored record.
    pub fn from_record(record: &CarRecord) -> Self {
        let car = &record.summary;
        Self {
            id: car.id,
            brand: car.brand.clone(),
            model: car.model.clone(),
            name: car.name.clone(),
            price: car.price.to_string(),
            year: car.year.map(|y| y.to_string()).unwrap_or_default(),
            condition: car.condition.as_str().to_string(),
            origin: car.origin.clone(),
            body_type: car.body_type.clone(),
            engine_type: car.engine_type.clone(),
            drivetrain: car.drivetrain.clone(),
            image: car.image.clone().unwrap_or_default(),
            description: record.description.clone().unwrap_or_default(),
            images: pretty(&record.images),
            options: pretty(&record.options),
            characteristics: pretty(&record.characteristics),
            accessories: pretty(&record.accessories),
            colors: pretty(&record.colors),
            specs: pretty(&record.specs),
        }
    }

    pub fn validate(&self) -> Result<CarRecord, ValidationErrors> {
        let mut errors = Vec::new();

        let mut required = |field: &'static str, value: &str| {
            let value = value.trim();
            if value.is_empty() {
                errors.push(FieldError { field, message: "must not be empty".to_string() });
            }
            value.to_string()
        };
        let brand = required("brand", &self.brand);
        let model = required("model", &self.model);
        let name = required("name", &self.name);

        let price = match self.price.trim().parse::<f64>() {
            Ok(p) if p.is_finite() && p >= 0.0 => p,
            _ => {
                errors.push(FieldError { field: "price", message: "must be a non-negative number".to_string() });
                0.0
            }
        };

        let year = match optional(&self.year) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(y) => Some(y),
                Err(_) => {
                    errors.push(FieldError { field: "year", message: "must be a whole number".to_string() });
                    None
                }
            },
        };

        let condition = CarCondition::parse(&self.condition).unwrap_or_else(|| {
            errors.push(FieldError { field: "condition", message: "must be \"new\" or \"used\"".to_string() });
            CarCondition::Used
        });

        let images = json_field(&mut errors, "images", &self.images);
        let options = json_field(&mut errors, "options", &self.options);
        let characteristics = json_field(&mut errors, "characteristics", &self.characteristics);
        let accessories = json_field(&mut errors, "accessories", &self.accessories);
        let colors = json_field(&mut errors, "colors", &self.colors);
        let specs = json_field(&mut errors, "specs", &self.specs);

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(CarRecord {
            summary: CarSummary {
                id: self.id,
                brand,
                model,
                name,
                price,
                year,
                condition,
                origin: self.origin.trim().to_string(),
                body_type: self.body_type.trim().to_string(),
                engine_type: self.engine_type.trim().to_string(),
                drivetrain: self.drivetrain.trim().to_string(),
                image: optional(&self.image),
            },
            description: optional(&self.description),
            images: images.unwrap_or_default(),
            options: options.unwrap_or_default(),
            characteristics: characteristics.unwrap_or_default(),
            accessories: accessories.unwrap_or_default(),
            colors: colors.unwrap_or_default(),
            specs: specs.unwrap_or_default(),
        })
    }
}

fn json_field<T: DeserializeOwned>(errors: &mut Vec<FieldError>, field: &'static str, text: &str) -> Option<T> {
    if text.trim().is_empty() {
        errors.push(FieldError { field, message: "must contain JSON".to_string() });
        return None;
    }
    match serde_json::from_str::<T>(text) {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(FieldError { field, message: format!("is not valid JSON for this field ({e})") });
            None
        }
    }
}
