use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        CarStatus,
        catalog::slug,
        listing::{self, ListingDraft, ValidListing},
        search::{CarSearchFilters, contains_pattern},
    },
    dto::cars::{CarList, CreateCarRequest, UpdateCarRequest},
    entity::cars::{ActiveModel as CarActive, Column as CarCol, Entity as Cars, Model as CarModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_admin, ensure_seller},
    models::Car,
    response::{ApiResponse, Meta},
    routes::params::{CarQuery, CarSortBy, SortOrder},
    state::AppState,
};

pub fn search_condition(filters: &CarSearchFilters) -> Condition {
    let mut condition = Condition::all();
    if let Some(brand) = filters.brand.as_ref().filter(|s| !s.trim().is_empty()) {
        condition = condition.add(CarCol::BrandSlug.eq(slug(brand)));
    }
    if let Some(model) = filters.model.as_ref().filter(|s| !s.trim().is_empty()) {
        condition = condition.add(Expr::col(CarCol::Model).ilike(contains_pattern(model)));
    }
    if let Some(city) = filters.city.as_ref().filter(|s| !s.trim().is_empty()) {
        condition = condition.add(Expr::col(CarCol::City).ilike(contains_pattern(city)));
    }
    if let Some(min_year) = filters.min_year {
        condition = condition.add(CarCol::Year.gte(min_year));
    }
    if let Some(max_year) = filters.max_year {
        condition = condition.add(CarCol::Year.lte(max_year));
    }
    if let Some(min_price) = filters.min_price {
        condition = condition.add(CarCol::Price.gte(min_price));
    }
    if let Some(max_price) = filters.max_price {
        condition = condition.add(CarCol::Price.lte(max_price));
    }
    if let Some(max_mileage) = filters.max_mileage {
        condition = condition.add(CarCol::MileageKm.lte(max_mileage));
    }
    if let Some(seller_id) = filters.seller_id {
        condition = condition.add(CarCol::SellerId.eq(seller_id));
    }
    condition
}

pub async fn list_cars(state: &AppState, query: CarQuery) -> AppResult<ApiResponse<CarList>> {
    let filters = query.filters();
    filters.validate()?;
    let (page, limit, offset) = query.pagination().normalize();
    let status = query.status.unwrap_or(CarStatus::Active);

    let condition = search_condition(&filters).add(CarCol::Status.eq(status.to_string()));
    let mut finder = Cars::find().filter(condition);

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match query.sort_by {
        // Default ordering puts boosted listings on top.
        None => finder
            .order_by(
                Expr::cust("CASE WHEN boost_until > NOW() THEN 0 ELSE 1 END"),
                Order::Asc,
            )
            .order_by_desc(CarCol::CreatedAt),
        Some(sort_by) => {
            let col = match sort_by {
                CarSortBy::CreatedAt => CarCol::CreatedAt,
                CarSortBy::Price => CarCol::Price,
                CarSortBy::Year => CarCol::Year,
                CarSortBy::Mileage => CarCol::MileageKm,
            };
            match sort_order {
                SortOrder::Asc => finder.order_by_asc(col),
                SortOrder::Desc => finder.order_by_desc(col),
            }
        }
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let now = Utc::now();
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| Car::from_entity(m, now))
        .collect();

    Ok(ApiResponse::success(
        "Cars",
        CarList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn find_car(state: &AppState, id: Uuid) -> AppResult<CarModel> {
    Cars::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_car(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Car>> {
    let car = find_car(state, id).await?;
    Ok(ApiResponse::success("Car", Car::from_entity(car, Utc::now()), None))
}

pub async fn list_my_cars(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CarList>> {
    ensure_seller(user)?;
    let now = Utc::now();
    let items: Vec<Car> = Cars::find()
        .filter(CarCol::SellerId.eq(user.user_id))
        .order_by_desc(CarCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| Car::from_entity(m, now))
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("My cars", CarList { items }, Some(meta)))
}

/// Active model for a new listing; shared with the fleet import commit.
pub fn new_car(seller_id: Uuid, listing: ValidListing) -> CarActive {
    CarActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        brand_slug: Set(slug(&listing.brand)),
        brand: Set(listing.brand),
        model: Set(listing.model),
        year: Set(listing.year),
        price: Set(listing.price),
        mileage_km: Set(listing.mileage_km),
        city: Set(listing.city),
        description: Set(listing.description),
        status: Set(CarStatus::Active.to_string()),
        boost_until: Set(None),
        highlight_until: Set(None),
        exposure_until: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
}

pub async fn create_car(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCarRequest,
) -> AppResult<ApiResponse<Car>> {
    ensure_seller(user)?;
    let draft = ListingDraft {
        brand: Some(payload.brand),
        model: Some(payload.model),
        year: Some(payload.year),
        price: Some(payload.price),
        mileage_km: payload.mileage_km,
        city: payload.city,
        description: payload.description,
    };
    let valid = listing::validate(&draft, Utc::now().year())
        .map_err(|errors| AppError::BadRequest(errors.join(", ")))?;

    let car = new_car(user.user_id, valid).insert(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "car_create",
        "cars",
        serde_json::json!({ "car_id": car.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Car created",
        Car::from_entity(car, Utc::now()),
        Some(Meta::empty()),
    ))
}

pub async fn update_car(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCarRequest,
) -> AppResult<ApiResponse<Car>> {
    let existing = find_car(state, id).await?;
    ensure_owner_or_admin(user, existing.seller_id)?;

    // Validate the merged listing, not just the changed fields.
    let merged = ListingDraft {
        brand: Some(payload.brand.clone().unwrap_or_else(|| existing.brand.clone())),
        model: Some(payload.model.clone().unwrap_or_else(|| existing.model.clone())),
        year: Some(payload.year.unwrap_or(existing.year)),
        price: Some(payload.price.unwrap_or(existing.price)),
        mileage_km: Some(payload.mileage_km.unwrap_or(existing.mileage_km)),
        city: payload.city.clone().or_else(|| existing.city.clone()),
        description: payload.description.clone().or_else(|| existing.description.clone()),
    };
    let valid = listing::validate(&merged, Utc::now().year())
        .map_err(|errors| AppError::BadRequest(errors.join(", ")))?;

    let mut active: CarActive = existing.into();
    active.brand_slug = Set(slug(&valid.brand));
    active.brand = Set(valid.brand);
    active.model = Set(valid.model);
    active.year = Set(valid.year);
    active.price = Set(valid.price);
    active.mileage_km = Set(valid.mileage_km);
    active.city = Set(valid.city);
    active.description = Set(valid.description);
    if let Some(status) = payload.status {
        active.status = Set(status.to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let car = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "car_update",
        "cars",
        serde_json::json!({ "car_id": car.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Car::from_entity(car, Utc::now()),
        Some(Meta::empty()),
    ))
}

pub async fn delete_car(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_car(state, id).await?;
    ensure_owner_or_admin(user, existing.seller_id)?;

    let result = Cars::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "car_delete",
        "cars",
        serde_json::json!({ "car_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
