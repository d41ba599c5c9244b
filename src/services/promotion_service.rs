use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        PromotionKind, PromotionOrderStatus, billing::DEFAULT_CURRENCY, parse_enum,
        promotions::{MAX_LINE_QUANTITY, extend_until},
    },
    dto::promotions::{
        CreatePromotionOrderRequest, CreatePromotionProductRequest, PromotionOrderList,
        PromotionOrderWithItems, PromotionProductList,
    },
    entity::{
        cars::{ActiveModel as CarActive, Entity as Cars},
        promotion_order_items::{
            ActiveModel as ItemActive, Column as ItemCol, Entity as PromotionOrderItems,
        },
        promotion_orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as PromotionOrders,
            Model as OrderModel,
        },
        promotion_products::{
            ActiveModel as ProductActive, Column as ProductCol, Entity as PromotionProducts,
            Model as ProductModel,
        },
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner_or_admin, ensure_seller},
    models::{PromotionOrder, PromotionOrderItem, PromotionProduct},
    response::{ApiResponse, Meta},
    services::billing_service::validate_currency,
    state::AppState,
};

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<PromotionProductList>> {
    let items: Vec<PromotionProduct> = PromotionProducts::find()
        .filter(ProductCol::IsActive.eq(true))
        .order_by_asc(ProductCol::Price)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PromotionProduct::from)
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Promotion products", PromotionProductList { items }, Some(meta)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionProductRequest,
) -> AppResult<ApiResponse<PromotionProduct>> {
    ensure_admin(user)?;
    let code = payload.code.trim().to_uppercase();
    if code.is_empty() || payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product code and name are required".into()));
    }
    if payload.price < 0 {
        return Err(AppError::BadRequest("Price must not be negative".into()));
    }
    if payload.duration_days <= 0 {
        return Err(AppError::BadRequest("Duration must be at least one day".into()));
    }
    let currency = payload
        .currency
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    validate_currency(&currency)?;
    let duplicate = PromotionProducts::find()
        .filter(ProductCol::Code.eq(code.as_str()))
        .one(&state.orm)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(format!("Product {code} already exists")));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        name: Set(payload.name.trim().to_string()),
        kind: Set(payload.kind.to_string()),
        price: Set(payload.price),
        currency: Set(currency),
        duration_days: Set(payload.duration_days),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "promotion_product_create",
        "promotion_products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        PromotionProduct::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionOrderRequest,
) -> AppResult<ApiResponse<PromotionOrderWithItems>> {
    ensure_seller(user)?;
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order has no items".into()));
    }
    if payload
        .items
        .iter()
        .any(|line| !(1..=MAX_LINE_QUANTITY).contains(&line.quantity))
    {
        return Err(AppError::BadRequest(format!(
            "Quantity must be between 1 and {MAX_LINE_QUANTITY}"
        )));
    }

    let product_ids: Vec<Uuid> = payload.items.iter().map(|line| line.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = PromotionProducts::find()
        .filter(ProductCol::Id.is_in(product_ids))
        .filter(ProductCol::IsActive.eq(true))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut total_amount: i64 = 0;
    let mut currency: Option<String> = None;
    let mut needs_car = false;
    for line in &payload.items {
        let product = products.get(&line.product_id).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown promotion product {}", line.product_id))
        })?;
        let kind = parse_enum::<PromotionKind>(&product.kind, "promotion kind")?;
        needs_car |= kind.is_car_scoped();
        match &currency {
            Some(c) if *c != product.currency => {
                return Err(AppError::BadRequest("Items must share one currency".into()));
            }
            _ => currency = Some(product.currency.clone()),
        }
        total_amount = product
            .price
            .checked_mul(i64::from(line.quantity))
            .and_then(|line_total| total_amount.checked_add(line_total))
            .ok_or_else(|| AppError::BadRequest("Order total is too large".into()))?;
    }

    match (needs_car, payload.car_id) {
        (true, None) => {
            return Err(AppError::BadRequest("car_id is required for listing promotions".into()));
        }
        (_, Some(car_id)) => {
            let car = Cars::find_by_id(car_id)
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound)?;
            if car.seller_id != user.user_id {
                return Err(AppError::Forbidden);
            }
        }
        (false, None) => {}
    }

    let txn = state.orm.begin().await?;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        car_id: Set(payload.car_id),
        status: Set(PromotionOrderStatus::Draft.to_string()),
        total_amount: Set(total_amount),
        currency: Set(currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let unit_price = products
            .get(&line.product_id)
            .map(|p| p.price)
            .unwrap_or_default();
        let item = ItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(PromotionOrderItem::from(item));
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "promotion_order_create",
        "promotion_orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        PromotionOrderWithItems {
            order: PromotionOrder::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<PromotionOrderList>> {
    let items: Vec<PromotionOrder> = PromotionOrders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PromotionOrder::from)
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Orders", PromotionOrderList { items }, Some(meta)))
}

async fn order_items<C: sea_orm::ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<PromotionOrderItem>> {
    let items = PromotionOrderItems::find()
        .filter(ItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?
        .into_iter()
        .map(PromotionOrderItem::from)
        .collect();
    Ok(items)
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<PromotionOrderWithItems>> {
    let order = PromotionOrders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, order.user_id)?;
    let items = order_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success(
        "OK",
        PromotionOrderWithItems {
            order: PromotionOrder::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Locks the caller's order and checks the requested transition.
async fn lock_order<C: sea_orm::ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
    next: PromotionOrderStatus,
) -> AppResult<OrderModel> {
    let order = PromotionOrders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = parse_enum::<PromotionOrderStatus>(&order.status, "order status")?;
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!("Order is {current}")));
    }
    Ok(order)
}

/// Records the payment and applies every line's promotion time.
pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<PromotionOrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, user, id, PromotionOrderStatus::Paid).await?;
    let items = order_items(&txn, order.id).await?;

    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let kinds: HashMap<Uuid, (PromotionKind, i32)> = PromotionProducts::find()
        .filter(ProductCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| {
            parse_enum::<PromotionKind>(&p.kind, "promotion kind")
                .map(|kind| (p.id, (kind, p.duration_days)))
        })
        .collect::<AppResult<_>>()?;

    let now = Utc::now();
    let mut car = match order.car_id {
        Some(car_id) => Some(
            Cars::find_by_id(car_id)
                .lock(LockType::Update)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::Conflict("Promoted car no longer exists".into()))?,
        ),
        None => None,
    };
    let mut brand_page_days: i64 = 0;

    for item in &items {
        let (kind, duration_days) = kinds
            .get(&item.product_id)
            .copied()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order references missing product")))?;
        let days = i64::from(duration_days) * i64::from(item.quantity);
        let utc = |v: Option<sea_orm::prelude::DateTimeWithTimeZone>| -> Option<DateTime<Utc>> {
            v.map(|dt| dt.with_timezone(&Utc))
        };
        match (kind, car.as_mut()) {
            (PromotionKind::BrandPage, _) => {
                brand_page_days = brand_page_days.checked_add(days).ok_or_else(|| {
                    AppError::BadRequest("Promotion period is out of range".into())
                })?;
            }
            (PromotionKind::Boost, Some(c)) => {
                c.boost_until = Some(extend_until(utc(c.boost_until), now, days)?.into());
            }
            (PromotionKind::Highlight, Some(c)) => {
                c.highlight_until = Some(extend_until(utc(c.highlight_until), now, days)?.into());
            }
            (PromotionKind::ExposurePlus, Some(c)) => {
                c.exposure_until = Some(extend_until(utc(c.exposure_until), now, days)?.into());
            }
            (_, None) => {
                return Err(AppError::Conflict("Listing promotion without a car".into()));
            }
        }
    }

    if let Some(car) = car {
        let mut active: CarActive = car.clone().into();
        active.boost_until = Set(car.boost_until);
        active.highlight_until = Set(car.highlight_until);
        active.exposure_until = Set(car.exposure_until);
        active.updated_at = Set(now.into());
        active.update(&txn).await?;
    }

    if brand_page_days > 0 {
        let seller = Users::find_by_id(order.user_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let current = seller.brand_page_until.map(|dt| dt.with_timezone(&Utc));
        let mut active: UserActive = seller.into();
        active.brand_page_until = Set(Some(extend_until(current, now, brand_page_days)?.into()));
        active.update(&txn).await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(PromotionOrderStatus::Paid.to_string());
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "promotion_order_paid",
        "promotion_orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        PromotionOrderWithItems {
            order: PromotionOrder::from(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<PromotionOrder>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, user, id, PromotionOrderStatus::Cancelled).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(PromotionOrderStatus::Cancelled.to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "promotion_order_cancel",
        "promotion_orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success("Order cancelled", PromotionOrder::from(order), Some(Meta::empty())))
}
