use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{CarStatus, LeadStatus, Role, search::CarSearchFilters};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CarSortBy {
    CreatedAt,
    Price,
    Year,
    Mileage,
}

// Query strings are kept flat: serde_urlencoded cannot parse numbers through `#[serde(flatten)]`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CarQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub max_mileage: Option<i32>,
    pub city: Option<String>,
    pub seller_id: Option<Uuid>,
    /// Defaults to ACTIVE on the public search.
    #[param(value_type = Option<String>)]
    pub status: Option<CarStatus>,
    #[param(value_type = Option<String>)]
    pub sort_by: Option<CarSortBy>,
    #[param(value_type = Option<String>)]
    pub sort_order: Option<SortOrder>,
}

impl CarQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn filters(&self) -> CarSearchFilters {
        CarSearchFilters {
            brand: self.brand.clone(),
            model: self.model.clone(),
            min_year: self.min_year,
            max_year: self.max_year,
            min_price: self.min_price,
            max_price: self.max_price,
            max_mileage: self.max_mileage,
            city: self.city.clone(),
            seller_id: self.seller_id,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<LeadStatus>,
}

impl LeadListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    #[param(value_type = Option<String>)]
    pub role: Option<Role>,
    /// Case-insensitive match on email or display name.
    pub q: Option<String>,
}

impl UserListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeadStatsQuery {
    #[param(value_type = Option<String>)]
    pub role: Option<Role>,
    /// `YYYY-MM`; all time when absent.
    pub month: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let p = Pagination {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(p.normalize(), (3, 20, 40));

        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert_eq!(p.normalize(), (i64::MAX, 100, i64::MAX));
    }
}
