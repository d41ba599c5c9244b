use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MIN_YEAR: i32 = 1950;

/// Listing fields as submitted by a seller or read from an import sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListingDraft {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<i64>,
    pub mileage_km: Option<i32>,
    pub city: Option<String>,
    pub description: Option<String>,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidListing {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub mileage_km: i32,
    pub city: Option<String>,
    pub description: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn check_year(year: i32, current_year: i32) -> Result<(), String> {
    if (MIN_YEAR..=current_year + 1).contains(&year) {
        Ok(())
    } else {
        Err(format!("year must be between {MIN_YEAR} and {}", current_year + 1))
    }
}

/// Collects every problem instead of stopping at the first, so an import
/// preview can show the seller all of them at once.
pub fn validate(draft: &ListingDraft, current_year: i32) -> Result<ValidListing, Vec<String>> {
    let mut errors = Vec::new();

    let brand = non_blank(&draft.brand);
    if brand.is_none() {
        errors.push("brand is required".to_string());
    }
    let model = non_blank(&draft.model);
    if model.is_none() {
        errors.push("model is required".to_string());
    }
    match draft.year {
        None => errors.push("year is required".to_string()),
        Some(year) => {
            if let Err(e) = check_year(year, current_year) {
                errors.push(e);
            }
        }
    }
    match draft.price {
        None => errors.push("price is required".to_string()),
        Some(p) if p < 0 => errors.push("price must not be negative".to_string()),
        Some(_) => {}
    }
    if draft.mileage_km.is_some_and(|m| m < 0) {
        errors.push("mileage must not be negative".to_string());
    }

    match (brand, model, draft.year, draft.price) {
        (Some(brand), Some(model), Some(year), Some(price)) if errors.is_empty() => {
            Ok(ValidListing {
                brand,
                model,
                year,
                price,
                mileage_km: draft.mileage_km.unwrap_or(0),
                city: non_blank(&draft.city),
                description: non_blank(&draft.description),
            })
        }
        _ => Err(errors),
    }
}
