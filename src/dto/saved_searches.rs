use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::search::CarSearchFilters, models::SavedSearch};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSavedSearchRequest {
    pub name: String,
    pub filters: CarSearchFilters,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SavedSearchList {
    #[schema(value_type = Vec<SavedSearch>)]
    pub items: Vec<SavedSearch>,
}
