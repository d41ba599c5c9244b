use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::cars::{CarList, CreateCarRequest, UpdateCarRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Car,
    response::ApiResponse,
    routes::params::CarQuery,
    services::car_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/{id}", get(get_car).put(update_car).delete(delete_car))
}

#[utoipa::path(
    get,
    path = "/api/cars",
    params(CarQuery),
    responses(
        (status = 200, description = "Search listings", body = ApiResponse<CarList>),
        (status = 400, description = "Invalid filter range")
    ),
    tag = "Cars"
)]
pub async fn list_cars(
    State(state): State<AppState>,
    Query(query): Query<CarQuery>,
) -> AppResult<Json<ApiResponse<CarList>>> {
    let resp = car_service::list_cars(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/cars/{id}",
    params(("id" = Uuid, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Get listing", body = ApiResponse<Car>),
        (status = 404, description = "Car not found"),
    ),
    tag = "Cars"
)]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Car>>> {
    let resp = car_service::get_car(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cars",
    request_body = CreateCarRequest,
    responses(
        (status = 201, description = "Create listing", body = ApiResponse<Car>),
        (status = 400, description = "Invalid listing"),
        (status = 403, description = "Not a seller")
    ),
    security(("bearer_auth" = [])),
    tag = "Cars"
)]
pub async fn create_car(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCarRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Car>>)> {
    let resp = car_service::create_car(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/cars/{id}",
    params(("id" = Uuid, Path, description = "Car ID")),
    request_body = UpdateCarRequest,
    responses(
        (status = 200, description = "Updated listing", body = ApiResponse<Car>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Car not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cars"
)]
pub async fn update_car(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCarRequest>,
) -> AppResult<Json<ApiResponse<Car>>> {
    let resp = car_service::update_car(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cars/{id}",
    params(("id" = Uuid, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Deleted listing"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Car not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cars"
)]
pub async fn delete_car(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = car_service::delete_car(&state, &user, id).await?;
    Ok(Json(resp))
}
