use car_marketplace_api::{
    config::AppConfig,
    db::{create_pool, run_migrations, create_orm_conn},
    domain::{PromotionKind, Role, billing::{DEFAULT_CURRENCY, FREE_PLAN_CODE}},
    services::auth_service::hash_password,
};
use uuid::Uuid;

struct PlanSeed {
    code: &'static str,
    name: &'static str,
    free_quota: i32,
    lead_price: i64,
    fixed_fee: i64,
}

// Amounts are in agorot.
const PLANS: [PlanSeed; 3] = [
    PlanSeed {
        code: FREE_PLAN_CODE,
        name: "Free",
        free_quota: 5,
        lead_price: 0,
        fixed_fee: 0,
    },
    PlanSeed {
        code: "BASIC",
        name: "Basic",
        free_quota: 30,
        lead_price: 1500,
        fixed_fee: 9900,
    },
    PlanSeed {
        code: "PRO",
        name: "Pro",
        free_quota: 150,
        lead_price: 1000,
        fixed_fee: 39900,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(&config.database_url).await?;

    let admin_email =
        std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
    let admin_password =
        std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin12345".to_string());
    let admin_id = ensure_admin(&pool, &admin_email, &admin_password).await?;

    seed_plans(&pool).await?;
    seed_promotions(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_admin(pool: &sqlx::PgPool, email: &str, password: &str) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password)?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, role)
        VALUES ($1, $2, $3, 'Administrator', $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.to_lowercase())
    .bind(password_hash)
    .bind(Role::Admin.to_string())
    .fetch_one(pool)
    .await?;

    println!("Ensured admin {email}");
    Ok(id)
}

async fn seed_plans(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for role in Role::sellers() {
        for plan in &PLANS {
            sqlx::query(
                r#"
                INSERT INTO billing_plans
                    (id, role, code, name, free_quota, lead_price, fixed_fee, currency, is_default)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (role, code) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(role.to_string())
            .bind(plan.code)
            .bind(plan.name)
            .bind(plan.free_quota)
            .bind(plan.lead_price)
            .bind(plan.fixed_fee)
            .bind(DEFAULT_CURRENCY)
            .bind(plan.code == FREE_PLAN_CODE)
            .execute(pool)
            .await?;
        }
        println!("Seeded plans for {role}");
    }
    Ok(())
}

async fn seed_promotions(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = [
        ("BOOST_7", "Boost for 7 days", PromotionKind::Boost, 2900_i64, 7),
        ("HIGHLIGHT_14", "Highlight for 14 days", PromotionKind::Highlight, 4900, 14),
        ("EXPOSURE_PLUS_30", "Exposure+ for 30 days", PromotionKind::ExposurePlus, 14900, 30),
        ("BRAND_PAGE_30", "Brand page for 30 days", PromotionKind::BrandPage, 29900, 30),
    ];

    for (code, name, kind, price, days) in products {
        sqlx::query(
            r#"
            INSERT INTO promotion_products (id, code, name, kind, price, currency, duration_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(name)
        .bind(kind.to_string())
        .bind(price)
        .bind(DEFAULT_CURRENCY)
        .bind(days)
        .execute(pool)
        .await?;
    }

    println!("Seeded promotion catalogue");
    Ok(())
}
