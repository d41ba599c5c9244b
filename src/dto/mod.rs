use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub mod auth;
pub mod billing;
pub mod cars;
pub mod import_jobs;
pub mod leads;
pub mod promotions;
pub mod saved_searches;

/// An item of a fan-out operation that failed while its siblings succeeded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FailedItem {
    pub id: Uuid,
    pub error: String,
}
