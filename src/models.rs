use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        PromotionKind,
        billing::{BillingOverrides, PlanTerms},
        promotions,
    },
    entity::{
        billing_plans, billing_snapshots, cars, import_jobs, leads, promotion_order_items,
        promotion_orders, promotion_products, saved_searches, users,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub subscription_plan: String,
    pub billing_plan_id: Option<Uuid>,
    pub custom_free_quota: Option<i32>,
    pub custom_lead_price: Option<i64>,
    pub custom_fixed_fee: Option<i64>,
    pub deal_notes: Option<String>,
    pub brand_page_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            phone: model.phone,
            role: model.role,
            subscription_plan: model.subscription_plan,
            billing_plan_id: model.billing_plan_id,
            custom_free_quota: model.custom_free_quota,
            custom_lead_price: model.custom_lead_price,
            custom_fixed_fee: model.custom_fixed_fee,
            deal_notes: model.deal_notes,
            brand_page_until: model.brand_page_until.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

pub fn overrides_of(user: &users::Model) -> BillingOverrides {
    BillingOverrides {
        free_quota: user.custom_free_quota,
        lead_price: user.custom_lead_price,
        fixed_fee: user.custom_fixed_fee,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingPlan {
    pub id: Uuid,
    pub role: String,
    pub code: String,
    pub name: String,
    pub free_quota: i32,
    pub lead_price: i64,
    pub fixed_fee: i64,
    pub currency: String,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<billing_plans::Model> for BillingPlan {
    fn from(model: billing_plans::Model) -> Self {
        Self {
            id: model.id,
            role: model.role,
            code: model.code,
            name: model.name,
            free_quota: model.free_quota,
            lead_price: model.lead_price,
            fixed_fee: model.fixed_fee,
            currency: model.currency,
            is_default: model.is_default,
            is_active: model.is_active,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

pub fn terms_of(plan: &billing_plans::Model) -> PlanTerms {
    PlanTerms {
        free_quota: plan.free_quota,
        lead_price: plan.lead_price,
        fixed_fee: plan.fixed_fee,
        currency: plan.currency.clone(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Car {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub brand: String,
    pub brand_slug: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub mileage_km: i32,
    pub city: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub badges: Vec<PromotionKind>,
    pub label: Option<String>,
    pub boost_until: Option<DateTime<Utc>>,
    pub highlight_until: Option<DateTime<Utc>>,
    pub exposure_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Car {
    /// Badges depend on the clock, so they are derived at read time.
    pub fn from_entity(model: cars::Model, now: DateTime<Utc>) -> Self {
        let boost_until = model.boost_until.map(|dt| dt.with_timezone(&Utc));
        let highlight_until = model.highlight_until.map(|dt| dt.with_timezone(&Utc));
        let exposure_until = model.exposure_until.map(|dt| dt.with_timezone(&Utc));
        let badges = promotions::badges(now, boost_until, highlight_until, exposure_until);
        let label = promotions::primary_label(&badges).map(str::to_string);
        Self {
            id: model.id,
            seller_id: model.seller_id,
            brand: model.brand,
            brand_slug: model.brand_slug,
            model: model.model,
            year: model.year,
            price: model.price,
            mileage_km: model.mileage_km,
            city: model.city,
            description: model.description,
            status: model.status,
            badges,
            label,
            boost_until,
            highlight_until,
            exposure_until,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub car_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub message: Option<String>,
    pub source: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<leads::Model> for Lead {
    fn from(model: leads::Model) -> Self {
        Self {
            id: model.id,
            seller_id: model.seller_id,
            car_id: model.car_id,
            customer_name: model.customer_name,
            customer_phone: model.customer_phone,
            customer_email: model.customer_email,
            message: model.message,
            source: model.source,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingSnapshot {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub month: String,
    pub leads_count: i32,
    pub free_quota: i32,
    pub lead_price: i64,
    pub fixed_fee: i64,
    pub amount_due: i64,
    pub currency: String,
    pub updated_at: DateTime<Utc>,
}

impl From<billing_snapshots::Model> for BillingSnapshot {
    fn from(model: billing_snapshots::Model) -> Self {
        Self {
            id: model.id,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            month: model.month,
            leads_count: model.leads_count,
            free_quota: model.free_quota,
            lead_price: model.lead_price,
            fixed_fee: model.fixed_fee,
            amount_due: model.amount_due,
            currency: model.currency,
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromotionProduct {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: String,
    pub price: i64,
    pub currency: String,
    pub duration_days: i32,
    pub is_active: bool,
}

impl From<promotion_products::Model> for PromotionProduct {
    fn from(model: promotion_products::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            kind: model.kind,
            price: model.price,
            currency: model.currency,
            duration_days: model.duration_days,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromotionOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Option<Uuid>,
    pub status: String,
    pub total_amount: i64,
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<promotion_orders::Model> for PromotionOrder {
    fn from(model: promotion_orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            car_id: model.car_id,
            status: model.status,
            total_amount: model.total_amount,
            currency: model.currency,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PromotionOrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

impl From<promotion_order_items::Model> for PromotionOrderItem {
    fn from(model: promotion_order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportJob {
    pub id: Uuid,
    pub yard_id: Uuid,
    pub file_name: String,
    pub status: String,
    pub total_rows: i32,
    pub valid_rows: i32,
    pub invalid_rows: i32,
    #[schema(value_type = Option<Object>)]
    pub row_errors: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub committed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<import_jobs::Model> for ImportJob {
    fn from(model: import_jobs::Model) -> Self {
        Self {
            id: model.id,
            yard_id: model.yard_id,
            file_name: model.file_name,
            status: model.status,
            total_rows: model.total_rows,
            valid_rows: model.valid_rows,
            invalid_rows: model.invalid_rows,
            row_errors: model.row_errors,
            error_message: model.error_message,
            committed_at: model.committed_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedSearch {
    pub id: Uuid,
    pub name: String,
    pub filters: crate::domain::search::CarSearchFilters,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl SavedSearch {
    pub fn from_entity(
        model: saved_searches::Model,
        base_url: &str,
    ) -> Result<Self, crate::error::AppError> {
        let filters = serde_json::from_value(model.filters).unwrap_or_default();
        let url = crate::domain::search::build_search_url(base_url, &filters)?;
        Ok(Self {
            id: model.id,
            name: model.name,
            filters,
            url,
            created_at: model.created_at.with_timezone(&Utc),
        })
    }
}
