use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::PromotionKind,
    models::{PromotionOrder, PromotionOrderItem, PromotionProduct},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromotionProductRequest {
    pub code: String,
    pub name: String,
    pub kind: PromotionKind,
    pub price: i64,
    pub currency: Option<String>,
    pub duration_days: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromotionOrderRequest {
    pub car_id: Option<Uuid>,
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromotionOrderWithItems {
    pub order: PromotionOrder,
    pub items: Vec<PromotionOrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PromotionProductList {
    #[schema(value_type = Vec<PromotionProduct>)]
    pub items: Vec<PromotionProduct>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PromotionOrderList {
    #[schema(value_type = Vec<PromotionOrder>)]
    pub items: Vec<PromotionOrder>,
}
