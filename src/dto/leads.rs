use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{LeadSource, LeadStatus},
    dto::FailedItem,
    models::Lead,
};

/// Contact form submitted from a listing or a seller page.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLeadRequest {
    pub car_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub message: Option<String>,
    pub source: Option<LeadSource>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLeadStatusRequest {
    pub status: LeadStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct LeadList {
    #[schema(value_type = Vec<Lead>)]
    pub items: Vec<Lead>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LeadStatusCounts {
    pub new: i64,
    pub in_progress: i64,
    pub closed: i64,
    pub lost: i64,
    pub total: i64,
}

impl LeadStatusCounts {
    pub fn add(&mut self, status: LeadStatus, count: i64) {
        match status {
            LeadStatus::New => self.new += count,
            LeadStatus::InProgress => self.in_progress += count,
            LeadStatus::Closed => self.closed += count,
            LeadStatus::Lost => self.lost += count,
        }
        self.total += count;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SellerLeadStats {
    pub seller_id: Uuid,
    pub display_name: String,
    pub counts: LeadStatusCounts,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeadStatsReport {
    pub month: Option<String>,
    pub rows: Vec<SellerLeadStats>,
    pub failed: Vec<FailedItem>,
}
