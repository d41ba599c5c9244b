use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::import_jobs::{ImportJobDetail, ImportJobList, UploadImportRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ImportJob,
    response::ApiResponse,
    services::import_service,
    state::AppState,
};

/// Fleet sheets are larger than ordinary request bodies.
pub const IMPORT_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_jobs)
                .post(upload)
                .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/{id}", get(get_job))
        .route("/{id}/commit", post(commit))
}

#[utoipa::path(
    post,
    path = "/api/import-jobs",
    request_body = UploadImportRequest,
    responses(
        (status = 202, description = "Upload accepted; poll the job for its preview", body = ApiResponse<ImportJob>),
        (status = 400, description = "Invalid upload"),
        (status = 403, description = "Only yards import fleets")
    ),
    security(("bearer_auth" = [])),
    tag = "Import"
)]
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UploadImportRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ImportJob>>)> {
    let resp = import_service::upload(&state, &user, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/import-jobs",
    responses(
        (status = 200, description = "Caller's import jobs", body = ApiResponse<ImportJobList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Import"
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ImportJobList>>> {
    let resp = import_service::list_jobs(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/import-jobs/{id}",
    params(("id" = Uuid, Path, description = "Import job ID")),
    responses(
        (status = 200, description = "Job status and preview", body = ApiResponse<ImportJobDetail>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Import"
)]
pub async fn get_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ImportJobDetail>>> {
    let resp = import_service::get_job(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/import-jobs/{id}/commit",
    params(("id" = Uuid, Path, description = "Import job ID")),
    responses(
        (status = 200, description = "Valid rows published as listings", body = ApiResponse<ImportJob>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Job is not ready to commit")
    ),
    security(("bearer_auth" = [])),
    tag = "Import"
)]
pub async fn commit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ImportJob>>> {
    let resp = import_service::commit(&state, &user, id).await?;
    Ok(Json(resp))
}
