use std::{sync::Arc, time::Duration};

use car_marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    domain::{
        LeadStatus, PromotionKind, Role, billing::month_key, listing::ListingDraft,
        promotions::MAX_LINE_QUANTITY, search::CarSearchFilters,
    },
    dto::{
        auth::{LoginRequest, RegisterRequest},
        billing::{
            CreateBillingPlanRequest, GenerateSnapshotsRequest, PlanQuery, RevenueQuery,
            UpdateBillingPlanRequest, UpdateSubscriptionRequest,
        },
        cars::CreateCarRequest,
        import_jobs::UploadImportRequest,
        leads::{CreateLeadRequest, UpdateLeadStatusRequest},
        promotions::{CreatePromotionOrderRequest, CreatePromotionProductRequest, OrderLine},
        saved_searches::CreateSavedSearchRequest,
    },
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{CarQuery, LeadStatsQuery},
    services::{
        auth_service, billing_service, car_service, import_service, lead_service,
        promotion_service, saved_search_service::{self, MAX_SAVED_SEARCHES},
    },
    state::AppState,
};
use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
            None
        }
    }
}

// Both flows truncate the same tables, so they run one after the other.
#[tokio::test]
async fn marketplace_flows() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    listing_lead_billing_and_promotion_flow(&database_url).await?;
    yard_import_and_saved_search_flow(&database_url).await?;
    admin_billing_rules_flow(&database_url).await?;
    concurrent_transitions_flow(&database_url).await?;
    Ok(())
}

// Seller lists a car, receives a lead, gets billed; admin snapshots the month; a paid boost shows on the listing.
async fn listing_lead_billing_and_promotion_flow(database_url: &str) -> anyhow::Result<()> {
    let state = setup_state(database_url).await?;

    let yard = register(&state, "yard@example.com", "Big Yard", Role::Yard).await?;
    let agent = register(&state, "agent@example.com", "Solo Agent", Role::Agent).await?;
    let admin = create_admin(&state).await?;

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "YARD@example.com".into(),
            password: "password123".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(login.token.starts_with("Bearer "));
    assert_eq!(login.user.id, yard.user_id);

    // Listing
    let car = car_service::create_car(
        &state,
        &yard,
        CreateCarRequest {
            brand: "Toyota".into(),
            model: "Corolla".into(),
            year: 2020,
            price: 85000,
            mileage_km: Some(60000),
            city: Some("Haifa".into()),
            description: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(car.brand_slug, "toyota");
    assert_eq!(car.status, "ACTIVE");
    assert!(car.badges.is_empty());

    let found = car_service::list_cars(
        &state,
        CarQuery {
            brand: Some("TOYOTA".into()),
            max_price: Some(90000),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert!(found.items.iter().any(|c| c.id == car.id));

    // Lead on the listing goes to its seller
    let lead = lead_service::create_lead(
        &state,
        CreateLeadRequest {
            car_id: Some(car.id),
            seller_id: None,
            customer_name: "Dana".into(),
            customer_phone: "050-1234567".into(),
            customer_email: None,
            message: Some("Is it still available?".into()),
            source: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(lead.seller_id, yard.user_id);
    assert_eq!(lead.status, "NEW");
    assert_eq!(audit_count(&state, "lead_create").await?, 1);

    let err = lead_service::update_lead_status(
        &state,
        &agent,
        lead.id,
        UpdateLeadStatusRequest {
            status: LeadStatus::InProgress,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let lead = set_lead_status(&state, &yard, lead.id, LeadStatus::InProgress).await?;
    assert_eq!(lead.status, "IN_PROGRESS");
    let err = lead_service::update_lead_status(
        &state,
        &yard,
        lead.id,
        UpdateLeadStatusRequest {
            status: LeadStatus::New,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    set_lead_status(&state, &yard, lead.id, LeadStatus::Closed).await?;

    // Billing: plan with no free quota, so the single lead is billable
    let plan = billing_service::create_plan(
        &state,
        &admin,
        CreateBillingPlanRequest {
            role: Role::Yard,
            code: "TEST".into(),
            name: "Test plan".into(),
            free_quota: 0,
            lead_price: 1000,
            fixed_fee: 5000,
            currency: None,
            is_default: false,
        },
    )
    .await?
    .data
    .unwrap();

    let err = billing_service::update_subscription(
        &state,
        &admin,
        agent.user_id,
        UpdateSubscriptionRequest {
            billing_plan_id: Some(plan.id),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "plan role must match the seller");

    let updated = billing_service::update_subscription(
        &state,
        &admin,
        yard.user_id,
        UpdateSubscriptionRequest {
            billing_plan_id: Some(plan.id),
            deal_notes: Some("First year discount".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.subscription_plan, "TEST");

    let usage = billing_service::my_usage(&state, &yard).await?.data.unwrap();
    assert_eq!(usage.leads, 1);
    assert_eq!(usage.plan_code, "TEST");
    assert_eq!(usage.amount_due, 6000);

    let month = month_key(Utc::now());
    let run = billing_service::generate_snapshots(
        &state,
        &admin,
        GenerateSnapshotsRequest {
            month: month.clone(),
        },
    )
    .await?
    .data
    .unwrap();
    assert!(run.failed.is_empty());
    let yard_snapshot = run
        .snapshots
        .iter()
        .find(|s| s.entity_id == yard.user_id)
        .expect("yard snapshot");
    assert_eq!(yard_snapshot.amount_due, 6000);

    // Regenerating the month updates in place
    let rerun = billing_service::generate_snapshots(
        &state,
        &admin,
        GenerateSnapshotsRequest {
            month: month.clone(),
        },
    )
    .await?
    .data
    .unwrap();
    let again = rerun
        .snapshots
        .iter()
        .find(|s| s.entity_id == yard.user_id)
        .expect("yard snapshot");
    assert_eq!(again.id, yard_snapshot.id);

    let revenue = billing_service::revenue(
        &state,
        &admin,
        RevenueQuery {
            from: month.clone(),
            to: month.clone(),
            role: Some(Role::Yard),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(revenue.rows.len(), 1);
    assert_eq!(revenue.total_amount_due, 6000);

    let stats = lead_service::lead_stats(
        &state,
        &admin,
        LeadStatsQuery {
            role: Some(Role::Yard),
            month: Some(month),
        },
    )
    .await?
    .data
    .unwrap();
    let row = stats
        .rows
        .iter()
        .find(|r| r.seller_id == yard.user_id)
        .expect("yard stats");
    assert_eq!(row.counts.closed, 1);
    assert_eq!(row.counts.total, 1);

    // Promotion
    let boost = promotion_service::create_product(
        &state,
        &admin,
        CreatePromotionProductRequest {
            code: "BOOST_TEST".into(),
            name: "Boost".into(),
            kind: PromotionKind::Boost,
            price: 2900,
            currency: None,
            duration_days: 7,
        },
    )
    .await?
    .data
    .unwrap();

    let err = promotion_service::create_order(
        &state,
        &agent,
        CreatePromotionOrderRequest {
            car_id: Some(car.id),
            items: vec![OrderLine {
                product_id: boost.id,
                quantity: 1,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let order = promotion_service::create_order(
        &state,
        &yard,
        CreatePromotionOrderRequest {
            car_id: Some(car.id),
            items: vec![OrderLine {
                product_id: boost.id,
                quantity: 2,
            }],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(order.order.status, "DRAFT");
    assert_eq!(order.order.total_amount, 5800);

    let paid = promotion_service::pay_order(&state, &yard, order.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(paid.order.status, "PAID");
    assert!(paid.order.paid_at.is_some());

    let promoted = car_service::get_car(&state, car.id).await?.data.unwrap();
    assert_eq!(promoted.badges, vec![PromotionKind::Boost]);
    assert_eq!(promoted.label.as_deref(), Some("Boosted"));
    let until = promoted.boost_until.expect("boost_until");
    assert!(until > Utc::now() + chrono::Duration::days(13));

    let err = promotion_service::cancel_order(&state, &yard, order.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = promotion_service::create_product(
        &state,
        &admin,
        CreatePromotionProductRequest {
            code: "BOOST_USD".into(),
            name: "Boost".into(),
            kind: PromotionKind::Boost,
            price: 900,
            currency: Some("usd".into()),
            duration_days: 7,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = promotion_service::create_order(
        &state,
        &yard,
        CreatePromotionOrderRequest {
            car_id: Some(car.id),
            items: vec![OrderLine {
                product_id: boost.id,
                quantity: 2_000_000_000,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Brand page time lands on the seller, not on a listing
    let brand_page = promotion_service::create_product(
        &state,
        &admin,
        CreatePromotionProductRequest {
            code: "BRAND_TEST".into(),
            name: "Brand page".into(),
            kind: PromotionKind::BrandPage,
            price: 19900,
            currency: None,
            duration_days: 30,
        },
    )
    .await?
    .data
    .unwrap();
    let order = promotion_service::create_order(
        &state,
        &yard,
        CreatePromotionOrderRequest {
            car_id: None,
            items: vec![OrderLine {
                product_id: brand_page.id,
                quantity: MAX_LINE_QUANTITY,
            }],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(order.order.total_amount, 19900 * i64::from(MAX_LINE_QUANTITY));
    promotion_service::pay_order(&state, &yard, order.order.id).await?;

    let me = auth_service::current_user(&state, &yard).await?.data.unwrap();
    let until = me.brand_page_until.expect("brand_page_until");
    let days = i64::from(30 * MAX_LINE_QUANTITY);
    assert!(until > Utc::now() + chrono::Duration::days(days - 1));
    assert!(until <= Utc::now() + chrono::Duration::days(days));

    Ok(())
}

async fn yard_import_and_saved_search_flow(database_url: &str) -> anyhow::Result<()> {
    let state = setup_state(database_url).await?;

    let yard = register(&state, "fleet@example.com", "Fleet Yard", Role::Yard).await?;
    let private = register(&state, "owner@example.com", "Car Owner", Role::Private).await?;
    let customer = register(&state, "buyer@example.com", "Buyer", Role::Customer).await?;

    let rows = vec![
        ListingDraft {
            brand: Some("Hyundai".into()),
            model: Some("i30".into()),
            year: Some(2021),
            price: Some(72000),
            mileage_km: Some(30000),
            city: Some("Tel Aviv".into()),
            description: None,
        },
        ListingDraft {
            brand: Some("Kia".into()),
            model: None,
            year: Some(1901),
            price: Some(10000),
            ..Default::default()
        },
    ];

    let err = import_service::upload(
        &state,
        &private,
        UploadImportRequest {
            file_name: "fleet.xlsx".into(),
            rows: rows.clone(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let job = import_service::upload(
        &state,
        &yard,
        UploadImportRequest {
            file_name: "fleet.xlsx".into(),
            rows,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(job.status, "UPLOADED");
    assert_eq!(job.total_rows, 2);

    let detail = wait_for_preview(&state, &yard, job.id).await?;
    assert_eq!(detail.job.status, "PREVIEW_READY");
    assert_eq!(detail.job.valid_rows, 1);
    assert_eq!(detail.job.invalid_rows, 1);
    assert_eq!(detail.preview.len(), 1);

    let committed = import_service::commit(&state, &yard, job.id)
        .await?
        .data
        .unwrap();
    assert_eq!(committed.status, "COMMITTED");
    assert!(committed.committed_at.is_some());

    let err = import_service::commit(&state, &yard, job.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let mine = car_service::list_my_cars(&state, &yard).await?.data.unwrap();
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].brand_slug, "hyundai");

    let empty = import_service::upload(
        &state,
        &yard,
        UploadImportRequest {
            file_name: "empty.xlsx".into(),
            rows: Vec::new(),
        },
    )
    .await?
    .data
    .unwrap();
    let detail = wait_for_preview(&state, &yard, empty.id).await?;
    assert_eq!(detail.job.status, "FAILED");
    assert!(detail.job.error_message.is_some());
    assert!(detail.preview.is_empty());
    let err = import_service::commit(&state, &yard, empty.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Saved search
    let saved = saved_search_service::create(
        &state,
        &customer,
        CreateSavedSearchRequest {
            name: "Family hatchbacks".into(),
            filters: CarSearchFilters {
                brand: Some("Hyundai".into()),
                max_price: Some(80000),
                ..Default::default()
            },
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(saved.url, "http://localhost:3000/cars?brand=hyundai&max_price=80000");

    let list = saved_search_service::list(&state, &customer).await?.data.unwrap();
    assert_eq!(list.items.len(), 1);

    let err = saved_search_service::delete(&state, &yard, saved.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound | AppError::Forbidden));
    saved_search_service::delete(&state, &customer, saved.id).await?;
    let list = saved_search_service::list(&state, &customer).await?.data.unwrap();
    assert!(list.items.is_empty());
    assert_eq!(audit_count(&state, "saved_search_create").await?, 1);
    assert_eq!(audit_count(&state, "saved_search_delete").await?, 1);

    for n in 0..MAX_SAVED_SEARCHES {
        saved_search_service::create(
            &state,
            &customer,
            CreateSavedSearchRequest {
                name: format!("Search {n}"),
                filters: CarSearchFilters::default(),
            },
        )
        .await?;
    }
    let err = saved_search_service::create(
        &state,
        &customer,
        CreateSavedSearchRequest {
            name: "One too many".into(),
            filters: CarSearchFilters::default(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

// One default plan per role, override clearing, and fan-outs that report a failing seller without dropping the rest.
async fn admin_billing_rules_flow(database_url: &str) -> anyhow::Result<()> {
    let state = setup_state(database_url).await?;
    let admin = create_admin(&state).await?;
    let yard = register(&state, "steady@example.com", "Steady Yard", Role::Yard).await?;
    let costly = register(&state, "costly@example.com", "Costly Yard", Role::Yard).await?;
    let agent = register(&state, "agent1@example.com", "Agent One", Role::Agent).await?;
    let broken = register(&state, "agent2@example.com", "Agent Two", Role::Agent).await?;

    let first = create_yard_plan(&state, &admin, "FIRST", true).await?;
    let second = create_yard_plan(&state, &admin, "SECOND", true).await?;
    assert_eq!(yard_defaults(&state).await?, vec![second.id]);

    billing_service::update_plan(
        &state,
        &admin,
        first.id,
        UpdateBillingPlanRequest {
            is_default: Some(true),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(yard_defaults(&state).await?, vec![first.id]);

    // Overrides are set, then cleared back to the plan
    let user = billing_service::update_subscription(
        &state,
        &admin,
        yard.user_id,
        UpdateSubscriptionRequest {
            custom_free_quota: Some(3),
            custom_lead_price: Some(200),
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(user.custom_free_quota, Some(3));
    assert_eq!(user.custom_lead_price, Some(200));

    let user = billing_service::update_subscription(
        &state,
        &admin,
        yard.user_id,
        UpdateSubscriptionRequest {
            clear_overrides: true,
            ..Default::default()
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(user.custom_free_quota, None);
    assert_eq!(user.custom_lead_price, None);
    assert_eq!(user.custom_fixed_fee, None);

    // Two billable leads at the largest price cannot be totalled
    billing_service::update_subscription(
        &state,
        &admin,
        costly.user_id,
        UpdateSubscriptionRequest {
            custom_free_quota: Some(0),
            custom_lead_price: Some(i64::MAX),
            ..Default::default()
        },
    )
    .await?;
    for name in ["Noa", "Omer"] {
        lead_service::create_lead(
            &state,
            CreateLeadRequest {
                car_id: None,
                seller_id: Some(costly.user_id),
                customer_name: name.into(),
                customer_phone: "050-7654321".into(),
                customer_email: None,
                message: None,
                source: None,
            },
        )
        .await?;
    }

    let run = billing_service::generate_snapshots(
        &state,
        &admin,
        GenerateSnapshotsRequest {
            month: month_key(Utc::now()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(run.failed.len(), 1);
    assert_eq!(run.failed[0].id, costly.user_id);
    assert!(run.snapshots.iter().any(|s| s.entity_id == yard.user_id));
    assert!(run.snapshots.iter().all(|s| s.entity_id != costly.user_id));

    // A lead with a status no build knows breaks only its seller's stats
    sqlx::query(
        "INSERT INTO leads (id, seller_id, customer_name, customer_phone, status) VALUES ($1, $2, 'Gil', '050-1112222', 'ARCHIVED')",
    )
    .bind(Uuid::new_v4())
    .bind(broken.user_id)
    .execute(&state.pool)
    .await?;

    let stats = lead_service::lead_stats(
        &state,
        &admin,
        LeadStatsQuery {
            role: Some(Role::Agent),
            month: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(stats.failed.len(), 1);
    assert_eq!(stats.failed[0].id, broken.user_id);
    assert_eq!(stats.rows.len(), 1);
    assert_eq!(stats.rows[0].seller_id, agent.user_id);

    Ok(())
}

// Racing requests on the same lead, import job or snapshot month.
async fn concurrent_transitions_flow(database_url: &str) -> anyhow::Result<()> {
    let state = setup_state(database_url).await?;
    let yard = register(&state, "race@example.com", "Race Yard", Role::Yard).await?;

    for n in 0..10 {
        let lead = lead_service::create_lead(
            &state,
            CreateLeadRequest {
                car_id: None,
                seller_id: Some(yard.user_id),
                customer_name: format!("Customer {n}"),
                customer_phone: "050-1234567".into(),
                customer_email: None,
                message: None,
                source: None,
            },
        )
        .await?
        .data
        .unwrap();

        let (closed, lost) = tokio::join!(
            lead_service::update_lead_status(
                &state,
                &yard,
                lead.id,
                UpdateLeadStatusRequest {
                    status: LeadStatus::Closed,
                },
            ),
            lead_service::update_lead_status(
                &state,
                &yard,
                lead.id,
                UpdateLeadStatusRequest {
                    status: LeadStatus::Lost,
                },
            ),
        );
        let winner = match (closed, lost) {
            (Ok(won), Err(AppError::Conflict(_))) | (Err(AppError::Conflict(_)), Ok(won)) => won,
            (a, b) => anyhow::bail!("expected one winner, got {:?} and {:?}", a.is_ok(), b.is_ok()),
        };
        let stored = lead_service::list_my_leads(&state, &yard, Default::default())
            .await?
            .data
            .unwrap()
            .items
            .into_iter()
            .find(|l| l.id == lead.id)
            .expect("stored lead");
        assert_eq!(stored.status, winner.data.unwrap().status);
    }

    let rows: Vec<ListingDraft> = ["Octavia", "Fabia", "Superb"]
        .into_iter()
        .map(|model| ListingDraft {
            brand: Some("Skoda".into()),
            model: Some(model.into()),
            year: Some(2019),
            price: Some(55000),
            ..Default::default()
        })
        .collect();
    let job = import_service::upload(
        &state,
        &yard,
        UploadImportRequest {
            file_name: "race.xlsx".into(),
            rows,
        },
    )
    .await?
    .data
    .unwrap();
    let detail = wait_for_preview(&state, &yard, job.id).await?;
    assert_eq!(detail.job.valid_rows, 3);

    let (a, b) = tokio::join!(
        import_service::commit(&state, &yard, job.id),
        import_service::commit(&state, &yard, job.id),
    );
    assert!(a.is_ok() != b.is_ok(), "exactly one commit must succeed");
    let mine = car_service::list_my_cars(&state, &yard).await?.data.unwrap();
    assert_eq!(mine.items.len(), 3);

    // Two snapshot runs for one month both land on the same row
    let admin = create_admin(&state).await?;
    let month = month_key(Utc::now());
    let (first, second) = tokio::join!(
        billing_service::generate_snapshots(
            &state,
            &admin,
            GenerateSnapshotsRequest {
                month: month.clone(),
            },
        ),
        billing_service::generate_snapshots(
            &state,
            &admin,
            GenerateSnapshotsRequest {
                month: month.clone(),
            },
        ),
    );
    let (first, second) = (first?.data.unwrap(), second?.data.unwrap());
    assert!(first.failed.is_empty() && second.failed.is_empty());
    assert_eq!(first.snapshots[0].id, second.snapshots[0].id);

    Ok(())
}

async fn create_yard_plan(
    state: &AppState,
    admin: &AuthUser,
    code: &str,
    is_default: bool,
) -> anyhow::Result<car_marketplace_api::models::BillingPlan> {
    let plan = billing_service::create_plan(
        state,
        admin,
        CreateBillingPlanRequest {
            role: Role::Yard,
            code: code.into(),
            name: format!("{code} plan"),
            free_quota: 10,
            lead_price: 500,
            fixed_fee: 1000,
            currency: None,
            is_default,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(plan)
}

async fn yard_defaults(state: &AppState) -> anyhow::Result<Vec<Uuid>> {
    let plans = billing_service::list_plans(
        state,
        PlanQuery {
            role: Some(Role::Yard),
        },
    )
    .await?
    .data
    .unwrap();
    Ok(plans
        .items
        .into_iter()
        .filter(|p| p.is_default)
        .map(|p| p.id)
        .collect())
}

async fn audit_count(state: &AppState, action: &str) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_logs WHERE action = $1")
        .bind(action)
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}

async fn wait_for_preview(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> anyhow::Result<car_marketplace_api::dto::import_jobs::ImportJobDetail> {
    for _ in 0..50 {
        let detail = import_service::get_job(state, user, id).await?.data.unwrap();
        if detail.job.status == "PREVIEW_READY" || detail.job.status == "FAILED" {
            return Ok(detail);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    anyhow::bail!("import job {id} never reached its preview")
}

async fn set_lead_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: LeadStatus,
) -> anyhow::Result<car_marketplace_api::models::Lead> {
    let resp =
        lead_service::update_lead_status(state, user, id, UpdateLeadStatusRequest { status })
            .await?;
    Ok(resp.data.unwrap())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, saved_searches, import_jobs, promotion_order_items, promotion_orders, promotion_products, billing_snapshots, leads, cars, users, billing_plans RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 3000,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        cors_origin: None,
        public_base_url: "http://localhost:3000".into(),
    };

    Ok(AppState {
        pool,
        orm,
        config: Arc::new(config),
    })
}

async fn register(
    state: &AppState,
    email: &str,
    display_name: &str,
    role: Role,
) -> anyhow::Result<AuthUser> {
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            email: email.into(),
            password: "password123".into(),
            display_name: display_name.into(),
            phone: None,
            role,
        },
    )
    .await?
    .data
    .unwrap();
    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set("admin@example.com".into()),
        password_hash: Set("dummy".into()),
        display_name: Set("Admin".into()),
        phone: Set(None),
        role: Set(Role::Admin.to_string()),
        subscription_plan: Set("FREE".into()),
        billing_plan_id: Set(None),
        custom_free_quota: Set(None),
        custom_lead_price: Set(None),
        custom_fixed_fee: Set(None),
        deal_notes: Set(None),
        brand_page_until: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: Role::Admin,
    })
}
