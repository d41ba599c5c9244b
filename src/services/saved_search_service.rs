use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::saved_searches::{CreateSavedSearchRequest, SavedSearchList},
    entity::saved_searches::{ActiveModel, Column, Entity as SavedSearches},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::SavedSearch,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MAX_SAVED_SEARCHES: usize = 50;

pub async fn create(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSavedSearchRequest,
) -> AppResult<ApiResponse<SavedSearch>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    payload.filters.validate()?;

    let existing = SavedSearches::find()
        .filter(Column::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    if existing as usize >= MAX_SAVED_SEARCHES {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_SAVED_SEARCHES} saved searches are allowed"
        )));
    }

    let filters = serde_json::to_value(&payload.filters)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    let saved = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(name),
        filters: Set(filters),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "saved_search_create",
        "saved_searches",
        serde_json::json!({ "saved_search_id": saved.id }),
    )
    .await;

    let data = SavedSearch::from_entity(saved, &state.config.public_base_url)?;
    Ok(ApiResponse::success("Search saved", data, Some(Meta::empty())))
}

pub async fn list(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SavedSearchList>> {
    let items = SavedSearches::find()
        .filter(Column::UserId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| SavedSearch::from_entity(m, &state.config.public_base_url))
        .collect::<AppResult<Vec<_>>>()?;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Saved searches", SavedSearchList { items }, Some(meta)))
}

pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = SavedSearches::delete_many()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "saved_search_delete",
        "saved_searches",
        serde_json::json!({ "saved_search_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
