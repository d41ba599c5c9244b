use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub subscription_plan: String,
    pub billing_plan_id: Option<Uuid>,
    pub custom_free_quota: Option<i32>,
    pub custom_lead_price: Option<i64>,
    pub custom_fixed_fee: Option<i64>,
    pub deal_notes: Option<String>,
    pub brand_page_until: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::billing_plans::Entity",
        from = "Column::BillingPlanId",
        to = "super::billing_plans::Column::Id"
    )]
    BillingPlans,
    #[sea_orm(has_many = "super::cars::Entity")]
    Cars,
    #[sea_orm(has_many = "super::leads::Entity")]
    Leads,
    #[sea_orm(has_many = "super::audit_logs::Entity")]
    AuditLogs,
}

impl Related<super::billing_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BillingPlans.def()
    }
}

impl Related<super::cars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl Related<super::leads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leads.def()
    }
}

impl Related<super::audit_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuditLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
