use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
};
use uuid::Uuid;

use crate::{
    dto::leads::{CreateLeadRequest, UpdateLeadStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Lead,
    response::ApiResponse,
    services::lead_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_lead))
        .route("/{id}/status", patch(update_lead_status))
}

#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Contact form submitted", body = ApiResponse<Lead>),
        (status = 400, description = "Invalid contact details"),
        (status = 404, description = "Car or seller not found")
    ),
    tag = "Leads"
)]
pub async fn create_lead(
    State(state): State<AppState>,
    Json(payload): Json<CreateLeadRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Lead>>)> {
    let resp = lead_service::create_lead(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/leads/{id}/status",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = UpdateLeadStatusRequest,
    responses(
        (status = 200, description = "Lead moved to the new status", body = ApiResponse<Lead>),
        (status = 403, description = "Permission denied"),
        (status = 404, description = "Lead not found"),
        (status = 409, description = "Transition not allowed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leads"
)]
pub async fn update_lead_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLeadStatusRequest>,
) -> AppResult<Json<ApiResponse<Lead>>> {
    let resp = lead_service::update_lead_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
