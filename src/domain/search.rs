use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::catalog::slug;
use crate::error::AppError;

/// Listing filters shared by the car search endpoint and saved searches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CarSearchFilters {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub max_mileage: Option<i32>,
    pub city: Option<String>,
    pub seller_id: Option<Uuid>,
}

impl CarSearchFilters {
    /// Present filters as query pairs, in a fixed order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mut pairs = Vec::new();
        if let Some(brand) = text(&self.brand) {
            pairs.push(("brand", slug(&brand)));
        }
        if let Some(model) = text(&self.model) {
            pairs.push(("model", model));
        }
        if let Some(v) = self.min_year {
            pairs.push(("min_year", v.to_string()));
        }
        if let Some(v) = self.max_year {
            pairs.push(("max_year", v.to_string()));
        }
        if let Some(v) = self.min_price {
            pairs.push(("min_price", v.to_string()));
        }
        if let Some(v) = self.max_price {
            pairs.push(("max_price", v.to_string()));
        }
        if let Some(v) = self.max_mileage {
            pairs.push(("max_mileage", v.to_string()));
        }
        if let Some(city) = text(&self.city) {
            pairs.push(("city", city));
        }
        if let Some(v) = self.seller_id {
            pairs.push(("seller_id", v.to_string()));
        }
        pairs
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if let (Some(min), Some(max)) = (self.min_year, self.max_year) {
            if min > max {
                return Err(AppError::BadRequest("min_year is greater than max_year".into()));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::BadRequest("min_price is greater than max_price".into()));
            }
        }
        Ok(())
    }
}

/// Shareable link to the listings page with the filters applied.
pub fn build_search_url(base: &str, filters: &CarSearchFilters) -> Result<String, AppError> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid public base url: {e}")))?;

    let path = format!("{}/cars", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);

    let pairs = filters.query_pairs();
    if !pairs.is_empty() {
        let mut query = url.query_pairs_mut();
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
    }

    Ok(url.to_string())
}

/// `%text%` for ILIKE, with the caller's wildcards matched literally.
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
