use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::billing::{BillingPlanList, PlanQuery},
    error::AppResult,
    response::ApiResponse,
    services::billing_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_plans))
}

#[utoipa::path(
    get,
    path = "/api/billing-plans",
    params(PlanQuery),
    responses(
        (status = 200, description = "Active billing plans", body = ApiResponse<BillingPlanList>)
    ),
    tag = "Billing"
)]
pub async fn list_plans(
    State(state): State<AppState>,
    Query(query): Query<PlanQuery>,
) -> AppResult<Json<ApiResponse<BillingPlanList>>> {
    let resp = billing_service::list_plans(&state, query).await?;
    Ok(Json(resp))
}
