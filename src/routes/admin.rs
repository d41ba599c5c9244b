use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    domain::billing::RevenueReport,
    dto::{
        auth::UserList,
        billing::{
            CreateBillingPlanRequest, GenerateSnapshotsRequest, RevenueQuery, SnapshotRun,
            UpdateBillingPlanRequest, UpdateSubscriptionRequest,
        },
        leads::LeadStatsReport,
        promotions::CreatePromotionProductRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{BillingPlan, PromotionProduct, User},
    response::ApiResponse,
    routes::params::{LeadStatsQuery, UserListQuery},
    services::{billing_service, lead_service, promotion_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/subscription", put(update_subscription))
        .route("/billing-plans", post(create_plan))
        .route("/billing-plans/{id}", put(update_plan))
        .route("/billing/snapshots", post(generate_snapshots))
        .route("/billing/revenue", get(revenue))
        .route("/leads/stats", get(lead_stats))
        .route("/promotions/products", post(create_promotion_product))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users with their billing settings (admin only)", body = ApiResponse<UserList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = billing_service::list_users(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/subscription",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Plan and deal updated", body = ApiResponse<User>),
        (status = 400, description = "Invalid plan or override"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSubscriptionRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = billing_service::update_subscription(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/billing-plans",
    request_body = CreateBillingPlanRequest,
    responses(
        (status = 201, description = "Plan created", body = ApiResponse<BillingPlan>),
        (status = 400, description = "Invalid plan"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Plan code already used for this role")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBillingPlanRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BillingPlan>>)> {
    let resp = billing_service::create_plan(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/admin/billing-plans/{id}",
    params(("id" = Uuid, Path, description = "Plan ID")),
    request_body = UpdateBillingPlanRequest,
    responses(
        (status = 200, description = "Plan updated", body = ApiResponse<BillingPlan>),
        (status = 400, description = "Invalid plan"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_plan(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBillingPlanRequest>,
) -> AppResult<Json<ApiResponse<BillingPlan>>> {
    let resp = billing_service::update_plan(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/billing/snapshots",
    request_body = GenerateSnapshotsRequest,
    responses(
        (status = 200, description = "Monthly snapshots written; per-seller failures are listed", body = ApiResponse<SnapshotRun>),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn generate_snapshots(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<GenerateSnapshotsRequest>,
) -> AppResult<Json<ApiResponse<SnapshotRun>>> {
    let resp = billing_service::generate_snapshots(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/billing/revenue",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Revenue per seller over a month range", body = ApiResponse<RevenueReport>),
        (status = 400, description = "Invalid month range"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn revenue(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RevenueQuery>,
) -> AppResult<Json<ApiResponse<RevenueReport>>> {
    let resp = billing_service::revenue(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/leads/stats",
    params(LeadStatsQuery),
    responses(
        (status = 200, description = "Lead counts per seller and status", body = ApiResponse<LeadStatsReport>),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn lead_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LeadStatsQuery>,
) -> AppResult<Json<ApiResponse<LeadStatsReport>>> {
    let resp = lead_service::lead_stats(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/promotions/products",
    request_body = CreatePromotionProductRequest,
    responses(
        (status = 201, description = "Promotion product added to the catalogue", body = ApiResponse<PromotionProduct>),
        (status = 400, description = "Invalid product"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Code already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_promotion_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePromotionProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PromotionProduct>>)> {
    let resp = promotion_service::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
