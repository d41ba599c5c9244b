use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::sea_query::extension::postgres::PgExpr;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        Role,
        billing::{
            self, DEFAULT_CURRENCY, FREE_PLAN_CODE, PlanTerms, RevenueReport, SnapshotFigures,
        },
        parse_enum,
        search::contains_pattern,
    },
    dto::{
        FailedItem,
        auth::UserList,
        billing::{
            BillingPlanList, CreateBillingPlanRequest, GenerateSnapshotsRequest, PlanQuery,
            RevenueQuery, SnapshotRun, UpdateBillingPlanRequest, UpdateSubscriptionRequest,
            UsageSummary,
        },
    },
    entity::{
        billing_plans::{ActiveModel as PlanActive, Column as PlanCol, Entity as BillingPlans},
        billing_snapshots::{
            ActiveModel as SnapshotActive, Column as SnapshotCol, Entity as BillingSnapshots,
            Model as SnapshotModel,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_seller},
    models::{BillingPlan, BillingSnapshot, User, overrides_of, terms_of},
    response::{ApiResponse, Meta},
    routes::params::UserListQuery,
    services::{auth_service::find_user, lead_service::count_leads_between},
    state::AppState,
};

pub fn validate_currency(currency: &str) -> AppResult<()> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Currency must be a 3-letter ISO code".into()))
    }
}

fn validate_amounts(free_quota: i32, lead_price: i64, fixed_fee: i64) -> AppResult<()> {
    if free_quota < 0 || lead_price < 0 || fixed_fee < 0 {
        return Err(AppError::BadRequest("Quota and prices must not be negative".into()));
    }
    Ok(())
}

pub async fn list_plans(state: &AppState, query: PlanQuery) -> AppResult<ApiResponse<BillingPlanList>> {
    let mut finder = BillingPlans::find().filter(PlanCol::IsActive.eq(true));
    if let Some(role) = query.role {
        finder = finder.filter(PlanCol::Role.eq(role.to_string()));
    }
    let items: Vec<BillingPlan> = finder
        .order_by_asc(PlanCol::Role)
        .order_by_asc(PlanCol::FixedFee)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(BillingPlan::from)
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Billing plans", BillingPlanList { items }, Some(meta)))
}

pub async fn create_plan(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBillingPlanRequest,
) -> AppResult<ApiResponse<BillingPlan>> {
    ensure_admin(user)?;
    if !payload.role.is_seller() {
        return Err(AppError::BadRequest("Plans can only be defined for seller roles".into()));
    }
    let code = payload.code.trim().to_uppercase();
    if code.is_empty() || payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Plan code and name are required".into()));
    }
    validate_amounts(payload.free_quota, payload.lead_price, payload.fixed_fee)?;
    let currency = payload
        .currency
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    validate_currency(&currency)?;

    let duplicate = BillingPlans::find()
        .filter(PlanCol::Role.eq(payload.role.to_string()))
        .filter(PlanCol::Code.eq(code.as_str()))
        .one(&state.orm)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(format!("Plan {code} already exists for {}", payload.role)));
    }

    let txn = state.orm.begin().await?;
    if payload.is_default {
        clear_default(&txn, payload.role).await?;
    }
    let plan = PlanActive {
        id: Set(Uuid::new_v4()),
        role: Set(payload.role.to_string()),
        code: Set(code),
        name: Set(payload.name.trim().to_string()),
        free_quota: Set(payload.free_quota),
        lead_price: Set(payload.lead_price),
        fixed_fee: Set(payload.fixed_fee),
        currency: Set(currency),
        is_default: Set(payload.is_default),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "billing_plan_create",
        "billing_plans",
        serde_json::json!({ "plan_id": plan.id, "code": plan.code }),
    )
    .await;

    Ok(ApiResponse::success("Plan created", BillingPlan::from(plan), Some(Meta::empty())))
}

/// At most one default plan per role.
async fn clear_default<C: sea_orm::ConnectionTrait>(conn: &C, role: Role) -> AppResult<()> {
    BillingPlans::update_many()
        .col_expr(PlanCol::IsDefault, Expr::value(false))
        .filter(PlanCol::Role.eq(role.to_string()))
        .filter(PlanCol::IsDefault.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn update_plan(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBillingPlanRequest,
) -> AppResult<ApiResponse<BillingPlan>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;
    let existing = BillingPlans::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let role = parse_enum::<Role>(&existing.role, "role")?;

    validate_amounts(
        payload.free_quota.unwrap_or(existing.free_quota),
        payload.lead_price.unwrap_or(existing.lead_price),
        payload.fixed_fee.unwrap_or(existing.fixed_fee),
    )?;
    if let Some(currency) = payload.currency.as_deref() {
        validate_currency(currency)?;
    }
    if payload.is_default == Some(true) {
        clear_default(&txn, role).await?;
    }

    let mut active: PlanActive = existing.into();
    if let Some(name) = payload.name.filter(|n| !n.trim().is_empty()) {
        active.name = Set(name.trim().to_string());
    }
    if let Some(v) = payload.free_quota {
        active.free_quota = Set(v);
    }
    if let Some(v) = payload.lead_price {
        active.lead_price = Set(v);
    }
    if let Some(v) = payload.fixed_fee {
        active.fixed_fee = Set(v);
    }
    if let Some(v) = payload.currency {
        active.currency = Set(v);
    }
    if let Some(v) = payload.is_default {
        active.is_default = Set(v);
    }
    if let Some(v) = payload.is_active {
        active.is_active = Set(v);
    }
    active.updated_at = Set(Utc::now().into());
    let plan = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "billing_plan_update",
        "billing_plans",
        serde_json::json!({ "plan_id": plan.id }),
    )
    .await;

    Ok(ApiResponse::success("Plan updated", BillingPlan::from(plan), Some(Meta::empty())))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(role) = query.role {
        condition = condition.add(UserCol::Role.eq(role.to_string()));
    }
    if let Some(q) = query.q.as_ref().filter(|s| !s.trim().is_empty()) {
        let pattern = contains_pattern(q);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Email).ilike(pattern.clone()))
                .add(Expr::col(UserCol::DisplayName).ilike(pattern)),
        );
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_subscription(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSubscriptionRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let target = find_user(state, id).await?;
    let role = parse_enum::<Role>(&target.role, "role")?;
    if !role.is_seller() {
        return Err(AppError::BadRequest("Only sellers have subscriptions".into()));
    }
    validate_amounts(
        payload.custom_free_quota.unwrap_or(0),
        payload.custom_lead_price.unwrap_or(0),
        payload.custom_fixed_fee.unwrap_or(0),
    )?;

    let plan = match payload.billing_plan_id {
        Some(plan_id) => {
            let plan = BillingPlans::find_by_id(plan_id)
                .one(&state.orm)
                .await?
                .ok_or_else(|| AppError::BadRequest("Unknown billing plan".into()))?;
            if !plan.is_active {
                return Err(AppError::BadRequest("Billing plan is not active".into()));
            }
            if plan.role != target.role {
                return Err(AppError::BadRequest(format!(
                    "Plan {} is for {}, user is {}",
                    plan.code, plan.role, target.role
                )));
            }
            Some(plan)
        }
        None => None,
    };

    let mut active: UserActive = target.into();
    if let Some(plan) = &plan {
        active.billing_plan_id = Set(Some(plan.id));
        active.subscription_plan = Set(plan.code.clone());
    }
    if payload.clear_overrides {
        active.custom_free_quota = Set(None);
        active.custom_lead_price = Set(None);
        active.custom_fixed_fee = Set(None);
    }
    if let Some(v) = payload.custom_free_quota {
        active.custom_free_quota = Set(Some(v));
    }
    if let Some(v) = payload.custom_lead_price {
        active.custom_lead_price = Set(Some(v));
    }
    if let Some(v) = payload.custom_fixed_fee {
        active.custom_fixed_fee = Set(Some(v));
    }
    if let Some(notes) = payload.deal_notes {
        active.deal_notes = Set(Some(notes).filter(|n| !n.trim().is_empty()));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "subscription_update",
        "users",
        serde_json::json!({
            "user_id": updated.id,
            "plan": updated.subscription_plan,
            "custom_free_quota": updated.custom_free_quota,
            "custom_lead_price": updated.custom_lead_price,
            "custom_fixed_fee": updated.custom_fixed_fee,
        }),
    )
    .await;

    Ok(ApiResponse::success("Subscription updated", User::from(updated), Some(Meta::empty())))
}

/// Plan code and the terms a seller is billed under right now.
pub async fn resolve_terms(state: &AppState, user: &UserModel) -> AppResult<(String, PlanTerms)> {
    let assigned = match user.billing_plan_id {
        Some(plan_id) => BillingPlans::find_by_id(plan_id).one(&state.orm).await?,
        None => None,
    };
    let role_default = if assigned.is_none() {
        BillingPlans::find()
            .filter(PlanCol::Role.eq(user.role.as_str()))
            .filter(PlanCol::IsDefault.eq(true))
            .filter(PlanCol::IsActive.eq(true))
            .one(&state.orm)
            .await?
    } else {
        None
    };

    let terms = billing::effective_terms(
        &overrides_of(user),
        assigned.as_ref().map(terms_of).as_ref(),
        role_default.as_ref().map(terms_of).as_ref(),
    );
    let code = assigned
        .as_ref()
        .or(role_default.as_ref())
        .map(|p| p.code.clone())
        .unwrap_or_else(|| FREE_PLAN_CODE.to_string());
    Ok((code, terms))
}

pub async fn my_usage(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UsageSummary>> {
    ensure_seller(user)?;
    let model = find_user(state, user.user_id).await?;
    let month = billing::month_key(Utc::now());
    let (start, end) = billing::month_bounds(&month)?;

    let leads = count_leads_between(state, model.id, start, end).await?;
    let (plan_code, terms) = resolve_terms(state, &model).await?;

    let summary = UsageSummary {
        amount_due: billing::amount_due(&terms, leads)?,
        warning: billing::usage_warning(leads, terms.free_quota),
        month,
        leads,
        plan_code,
        terms,
    };
    Ok(ApiResponse::success("Usage", summary, Some(Meta::empty())))
}

async fn snapshot_for(state: &AppState, seller: UserModel, month: &str) -> AppResult<SnapshotModel> {
    let (start, end) = billing::month_bounds(month)?;
    let leads = count_leads_between(state, seller.id, start, end).await?;
    let (_, terms) = resolve_terms(state, &seller).await?;
    let amount_due = billing::amount_due(&terms, leads)?;
    let leads_count = i32::try_from(leads)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("lead count out of range")))?;

    // Reruns for the same month overwrite the figures in place.
    let now = Utc::now();
    let snapshot = BillingSnapshots::insert(SnapshotActive {
        id: Set(Uuid::new_v4()),
        entity_type: Set(seller.role.clone()),
        entity_id: Set(seller.id),
        month: Set(month.to_string()),
        leads_count: Set(leads_count),
        free_quota: Set(terms.free_quota),
        lead_price: Set(terms.lead_price),
        fixed_fee: Set(terms.fixed_fee),
        amount_due: Set(amount_due),
        currency: Set(terms.currency),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
    .on_conflict(
        OnConflict::columns([SnapshotCol::EntityId, SnapshotCol::Month])
            .update_columns([
                SnapshotCol::EntityType,
                SnapshotCol::LeadsCount,
                SnapshotCol::FreeQuota,
                SnapshotCol::LeadPrice,
                SnapshotCol::FixedFee,
                SnapshotCol::AmountDue,
                SnapshotCol::Currency,
                SnapshotCol::UpdatedAt,
            ])
            .to_owned(),
    )
    .exec_with_returning(&state.orm)
    .await?;
    Ok(snapshot)
}

/// Compute (or recompute) every seller's snapshot for a month. Sellers are
/// processed concurrently and independently.
pub async fn generate_snapshots(
    state: &AppState,
    user: &AuthUser,
    payload: GenerateSnapshotsRequest,
) -> AppResult<ApiResponse<SnapshotRun>> {
    ensure_admin(user)?;
    let month = payload.month.trim().to_string();
    billing::month_bounds(&month)?;

    let seller_roles: Vec<String> = Role::sellers().iter().map(Role::to_string).collect();
    let sellers = Users::find()
        .filter(UserCol::Role.is_in(seller_roles))
        .all(&state.orm)
        .await?;

    let mut tasks = JoinSet::new();
    for seller in sellers {
        let state = state.clone();
        let month = month.clone();
        tasks.spawn(async move {
            let seller_id = seller.id;
            (seller_id, snapshot_for(&state, seller, &month).await)
        });
    }

    let mut snapshots = Vec::new();
    let mut failed = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(snapshot))) => snapshots.push(BillingSnapshot::from(snapshot)),
            Ok((seller_id, Err(err))) => {
                tracing::warn!(seller_id = %seller_id, error = %err, "billing snapshot failed");
                failed.push(FailedItem {
                    id: seller_id,
                    error: err.to_string(),
                });
            }
            Err(err) => tracing::error!(error = %err, "billing snapshot task aborted"),
        }
    }
    snapshots.sort_by(|a, b| b.amount_due.cmp(&a.amount_due));

    audit::record(
        &state.pool,
        user.user_id,
        "billing_snapshots_generate",
        "billing_snapshots",
        serde_json::json!({ "month": month, "ok": snapshots.len(), "failed": failed.len() }),
    )
    .await;

    let meta = Meta::total(snapshots.len());
    Ok(ApiResponse::success(
        "Snapshots generated",
        SnapshotRun {
            month,
            snapshots,
            failed,
        },
        Some(meta),
    ))
}

pub async fn revenue(
    state: &AppState,
    user: &AuthUser,
    query: RevenueQuery,
) -> AppResult<ApiResponse<RevenueReport>> {
    ensure_admin(user)?;
    billing::month_bounds(&query.from)?;
    billing::month_bounds(&query.to)?;
    // YYYY-MM keys order lexicographically.
    if query.from > query.to {
        return Err(AppError::BadRequest("from must not be after to".into()));
    }

    let mut finder = BillingSnapshots::find()
        .filter(SnapshotCol::Month.gte(query.from.as_str()))
        .filter(SnapshotCol::Month.lte(query.to.as_str()));
    if let Some(role) = query.role {
        finder = finder.filter(SnapshotCol::EntityType.eq(role.to_string()));
    }
    let figures: Vec<SnapshotFigures> = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|s| SnapshotFigures {
            entity_type: s.entity_type,
            entity_id: s.entity_id,
            month: s.month,
            leads_count: i64::from(s.leads_count),
            amount_due: s.amount_due,
            currency: s.currency,
        })
        .collect();

    let report = billing::aggregate_revenue(&figures);
    let meta = Meta::total(report.rows.len());
    Ok(ApiResponse::success("Revenue", report, Some(meta)))
}
