use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::promotions::{
        CreatePromotionOrderRequest, PromotionOrderList, PromotionOrderWithItems,
        PromotionProductList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::PromotionOrder,
    response::ApiResponse,
    services::promotion_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/pay", post(pay_order))
        .route("/orders/{id}/cancel", post(cancel_order))
}

#[utoipa::path(
    get,
    path = "/api/promotions/products",
    responses(
        (status = 200, description = "Promotion catalogue", body = ApiResponse<PromotionProductList>)
    ),
    tag = "Promotions"
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PromotionProductList>>> {
    let resp = promotion_service::list_products(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promotions/orders",
    request_body = CreatePromotionOrderRequest,
    responses(
        (status = 201, description = "Draft order created", body = ApiResponse<PromotionOrderWithItems>),
        (status = 400, description = "Invalid items"),
        (status = 403, description = "Car belongs to another seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePromotionOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PromotionOrderWithItems>>)> {
    let resp = promotion_service::create_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/promotions/orders",
    responses(
        (status = 200, description = "Caller's promotion orders", body = ApiResponse<PromotionOrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<PromotionOrderList>>> {
    let resp = promotion_service::list_my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/promotions/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<PromotionOrderWithItems>),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PromotionOrderWithItems>>> {
    let resp = promotion_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promotions/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Payment recorded and promotion applied", body = ApiResponse<PromotionOrderWithItems>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn pay_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PromotionOrderWithItems>>> {
    let resp = promotion_service::pay_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promotions/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = ApiResponse<PromotionOrder>),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not a draft")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PromotionOrder>>> {
    let resp = promotion_service::cancel_order(&state, &user, id).await?;
    Ok(Json(resp))
}
