use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    domain::{
        Role,
        billing::{PlanTerms, UsageWarning},
    },
    dto::FailedItem,
    models::{BillingPlan, BillingSnapshot},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBillingPlanRequest {
    pub role: Role,
    pub code: String,
    pub name: String,
    pub free_quota: i32,
    pub lead_price: i64,
    pub fixed_fee: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBillingPlanRequest {
    pub name: Option<String>,
    pub free_quota: Option<i32>,
    pub lead_price: Option<i64>,
    pub fixed_fee: Option<i64>,
    pub currency: Option<String>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BillingPlanList {
    #[schema(value_type = Vec<BillingPlan>)]
    pub items: Vec<BillingPlan>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PlanQuery {
    #[param(value_type = Option<String>)]
    pub role: Option<Role>,
}

/// Plan assignment plus the per-customer deal. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub billing_plan_id: Option<Uuid>,
    pub custom_free_quota: Option<i32>,
    pub custom_lead_price: Option<i64>,
    pub custom_fixed_fee: Option<i64>,
    pub deal_notes: Option<String>,
    /// Drop every override and bill by the plan alone.
    #[serde(default)]
    pub clear_overrides: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageSummary {
    pub month: String,
    pub leads: i64,
    pub plan_code: String,
    pub terms: PlanTerms,
    pub amount_due: i64,
    pub warning: UsageWarning,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateSnapshotsRequest {
    pub month: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotRun {
    pub month: String,
    pub snapshots: Vec<BillingSnapshot>,
    pub failed: Vec<FailedItem>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RevenueQuery {
    /// First month, `YYYY-MM`.
    pub from: String,
    /// Last month, inclusive.
    pub to: String,
    #[param(value_type = Option<String>)]
    pub role: Option<Role>,
}
