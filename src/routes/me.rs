use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{billing::UsageSummary, cars::CarList, leads::LeadList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    routes::params::LeadListQuery,
    services::{auth_service, billing_service, car_service, lead_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(profile))
        .route("/usage", get(usage))
        .route("/cars", get(my_cars))
        .route("/leads", get(my_leads))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::current_user(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/me/usage",
    responses(
        (status = 200, description = "Leads used this month against the plan quota", body = ApiResponse<UsageSummary>),
        (status = 403, description = "Not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
pub async fn usage(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UsageSummary>>> {
    let resp = billing_service::my_usage(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/me/cars",
    responses(
        (status = 200, description = "Listings owned by the caller, any status", body = ApiResponse<CarList>),
        (status = 403, description = "Not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
pub async fn my_cars(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CarList>>> {
    let resp = car_service::list_my_cars(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/me/leads",
    params(LeadListQuery),
    responses(
        (status = 200, description = "Leads received by the caller, newest first", body = ApiResponse<LeadList>),
        (status = 403, description = "Not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Me"
)]
pub async fn my_leads(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LeadListQuery>,
) -> AppResult<Json<ApiResponse<LeadList>>> {
    let resp = lead_service::list_my_leads(&state, &user, query).await?;
    Ok(Json(resp))
}
