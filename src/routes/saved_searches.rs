use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::saved_searches::{CreateSavedSearchRequest, SavedSearchList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::SavedSearch,
    response::ApiResponse,
    services::saved_search_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_saved).post(create_saved))
        .route("/{id}", delete(delete_saved))
}

#[utoipa::path(
    post,
    path = "/api/saved-searches",
    request_body = CreateSavedSearchRequest,
    responses(
        (status = 201, description = "Search saved with its shareable link", body = ApiResponse<SavedSearch>),
        (status = 400, description = "Invalid filters")
    ),
    security(("bearer_auth" = [])),
    tag = "Saved searches"
)]
pub async fn create_saved(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSavedSearchRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SavedSearch>>)> {
    let resp = saved_search_service::create(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/saved-searches",
    responses(
        (status = 200, description = "Caller's saved searches", body = ApiResponse<SavedSearchList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Saved searches"
)]
pub async fn list_saved(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SavedSearchList>>> {
    let resp = saved_search_service::list(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/saved-searches/{id}",
    params(("id" = Uuid, Path, description = "Saved search ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Saved searches"
)]
pub async fn delete_saved(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = saved_search_service::delete(&state, &user, id).await?;
    Ok(Json(resp))
}
