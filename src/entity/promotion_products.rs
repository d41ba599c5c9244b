use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promotion_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub kind: String,
    pub price: i64,
    pub currency: String,
    pub duration_days: i32,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::promotion_order_items::Entity")]
    PromotionOrderItems,
}

impl Related<super::promotion_order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionOrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
