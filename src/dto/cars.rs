use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::CarStatus, models::Car};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCarRequest {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub mileage_km: Option<i32>,
    pub city: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCarRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<i64>,
    pub mileage_km: Option<i32>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub status: Option<CarStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CarList {
    #[schema(value_type = Vec<Car>)]
    pub items: Vec<Car>,
}
