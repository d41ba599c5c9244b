use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    domain::{LeadSource, LeadStatus, Role, billing::month_bounds, parse_enum},
    dto::{
        FailedItem,
        leads::{
            CreateLeadRequest, LeadList, LeadStatsReport, LeadStatusCounts, SellerLeadStats,
            UpdateLeadStatusRequest,
        },
    },
    entity::{
        leads::{ActiveModel as LeadActive, Column as LeadCol, Entity as Leads},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_owner_or_admin, ensure_seller},
    models::Lead,
    response::{ApiResponse, Meta},
    routes::params::{LeadListQuery, LeadStatsQuery},
    services::{auth_service::find_user, car_service::find_car},
    state::AppState,
};

fn valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    digits >= 7
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
}

pub async fn create_lead(
    state: &AppState,
    payload: CreateLeadRequest,
) -> AppResult<ApiResponse<Lead>> {
    let customer_name = payload.customer_name.trim().to_string();
    let customer_phone = payload.customer_phone.trim().to_string();
    if customer_name.is_empty() {
        return Err(AppError::BadRequest("Customer name is required".into()));
    }
    if !valid_phone(&customer_phone) {
        return Err(AppError::BadRequest("Invalid phone number".into()));
    }

    // A listing determines its seller; otherwise the form was on a seller page.
    let (seller_id, car_id) = match (payload.car_id, payload.seller_id) {
        (Some(car_id), _) => {
            let car = find_car(state, car_id).await?;
            (car.seller_id, Some(car.id))
        }
        (None, Some(seller_id)) => (seller_id, None),
        (None, None) => {
            return Err(AppError::BadRequest("car_id or seller_id is required".into()));
        }
    };

    let seller = find_user(state, seller_id).await?;
    let seller_role = parse_enum::<Role>(&seller.role, "role")?;
    if !seller_role.is_seller() {
        return Err(AppError::BadRequest("Target is not a seller".into()));
    }

    let lead = LeadActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        car_id: Set(car_id),
        customer_name: Set(customer_name),
        customer_phone: Set(customer_phone),
        customer_email: Set(payload.customer_email.filter(|e| !e.trim().is_empty())),
        message: Set(payload.message.filter(|m| !m.trim().is_empty())),
        source: Set(payload.source.unwrap_or(LeadSource::WebForm).to_string()),
        status: Set(LeadStatus::New.to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(lead_id = %lead.id, seller_id = %seller_id, "lead received");

    audit::record(
        &state.pool,
        None::<Uuid>,
        "lead_create",
        "leads",
        serde_json::json!({ "lead_id": lead.id, "seller_id": seller_id, "car_id": car_id }),
    )
    .await;

    Ok(ApiResponse::success("Lead created", Lead::from(lead), Some(Meta::empty())))
}

pub async fn list_my_leads(
    state: &AppState,
    user: &AuthUser,
    query: LeadListQuery,
) -> AppResult<ApiResponse<LeadList>> {
    ensure_seller(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(LeadCol::SellerId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(LeadCol::Status.eq(status.to_string()));
    }

    let finder = Leads::find()
        .filter(condition)
        .order_by_desc(LeadCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Lead::from)
        .collect();

    Ok(ApiResponse::success(
        "Leads",
        LeadList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_lead_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateLeadStatusRequest,
) -> AppResult<ApiResponse<Lead>> {
    let existing = Leads::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_admin(user, existing.seller_id)?;

    let current = parse_enum::<LeadStatus>(&existing.status, "lead status")?;
    let next = payload.status;
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "Lead cannot move from {current} to {next}"
        )));
    }

    // Only the status that was checked may be replaced; a concurrent update wins.
    let updated = Leads::update_many()
        .col_expr(LeadCol::Status, Expr::value(next.to_string()))
        .col_expr(LeadCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(LeadCol::Id.eq(id))
        .filter(LeadCol::Status.eq(current.to_string()))
        .exec(&state.orm)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::Conflict(format!("Lead is no longer {current}")));
    }
    let lead = Leads::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        user.user_id,
        "lead_status_update",
        "leads",
        serde_json::json!({ "lead_id": lead.id, "from": current, "to": next }),
    )
    .await;

    Ok(ApiResponse::success("Lead updated", Lead::from(lead), Some(Meta::empty())))
}

/// Leads a seller received in `[start, end)`.
pub async fn count_leads_between(
    state: &AppState,
    seller_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<i64> {
    let count = Leads::find()
        .filter(LeadCol::SellerId.eq(seller_id))
        .filter(LeadCol::CreatedAt.gte(start))
        .filter(LeadCol::CreatedAt.lt(end))
        .count(&state.orm)
        .await?;
    Ok(count as i64)
}

async fn status_counts(
    pool: &DbPool,
    seller_id: Uuid,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> AppResult<LeadStatusCounts> {
    let rows: Vec<(String, i64)> = match range {
        Some((start, end)) => {
            sqlx::query_as(
                r#"
                SELECT status, COUNT(*) FROM leads
                WHERE seller_id = $1 AND created_at >= $2 AND created_at < $3
                GROUP BY status
                "#,
            )
            .bind(seller_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT status, COUNT(*) FROM leads WHERE seller_id = $1 GROUP BY status")
                .bind(seller_id)
                .fetch_all(pool)
                .await?
        }
    };

    let mut counts = LeadStatusCounts::default();
    for (status, count) in rows {
        counts.add(parse_enum::<LeadStatus>(&status, "lead status")?, count);
    }
    Ok(counts)
}

/// Per-seller lead counts. Each seller is loaded by its own task; one failing
/// seller is reported in `failed` without hiding the others.
pub async fn lead_stats(
    state: &AppState,
    user: &AuthUser,
    query: LeadStatsQuery,
) -> AppResult<ApiResponse<LeadStatsReport>> {
    ensure_admin(user)?;
    let role = query.role.unwrap_or(Role::Yard);
    if !role.is_seller() {
        return Err(AppError::BadRequest("Lead stats are only kept for seller roles".into()));
    }
    let range = query.month.as_deref().map(month_bounds).transpose()?;

    let sellers = Users::find()
        .filter(UserCol::Role.eq(role.to_string()))
        .order_by_asc(UserCol::DisplayName)
        .all(&state.orm)
        .await?;

    let mut tasks = JoinSet::new();
    for seller in sellers {
        let pool = state.pool.clone();
        tasks.spawn(async move {
            let result = status_counts(&pool, seller.id, range).await;
            (seller.id, seller.display_name, result)
        });
    }

    let mut rows = Vec::new();
    let mut failed = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((seller_id, display_name, Ok(counts))) => rows.push(SellerLeadStats {
                seller_id,
                display_name,
                counts,
            }),
            Ok((seller_id, _, Err(err))) => {
                tracing::warn!(seller_id = %seller_id, error = %err, "lead stats failed");
                failed.push(FailedItem {
                    id: seller_id,
                    error: err.to_string(),
                });
            }
            Err(err) => tracing::error!(error = %err, "lead stats task aborted"),
        }
    }
    rows.sort_by(|a, b| {
        b.counts
            .total
            .cmp(&a.counts.total)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    let meta = Meta::total(rows.len());
    Ok(ApiResponse::success(
        "Lead stats",
        LeadStatsReport {
            month: query.month,
            rows,
            failed,
        },
        Some(meta),
    ))
}

#[cfg(test)]
mod tests {
    use super::valid_phone;

    #[test]
    fn phone_numbers_need_seven_digits() {
        assert!(valid_phone("052-1234567"));
        assert!(valid_phone("+972 52 123 4567"));
        assert!(!valid_phone("12345"));
        assert!(!valid_phone("call me 0521234567"));
    }
}
