use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promotion_order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::promotion_orders::Entity",
        from = "Column::OrderId",
        to = "super::promotion_orders::Column::Id"
    )]
    PromotionOrders,
    #[sea_orm(
        belongs_to = "super::promotion_products::Entity",
        from = "Column::ProductId",
        to = "super::promotion_products::Column::Id"
    )]
    PromotionProducts,
}

impl Related<super::promotion_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionOrders.def()
    }
}

impl Related<super::promotion_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PromotionProducts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
