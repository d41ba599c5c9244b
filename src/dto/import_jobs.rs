use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::listing::ListingDraft, models::ImportJob};

/// Rows of the fleet sheet, already read from the file by the client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadImportRequest {
    pub file_name: String,
    pub rows: Vec<ListingDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RowError {
    /// 1-based, as the seller sees it in the sheet.
    pub row: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportJobDetail {
    pub job: ImportJob,
    /// First valid rows, shown before the seller commits.
    pub preview: Vec<ListingDraft>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ImportJobList {
    #[schema(value_type = Vec<ImportJob>)]
    pub items: Vec<ImportJob>,
}
