pub mod audit_logs;
pub mod billing_plans;
pub mod billing_snapshots;
pub mod cars;
pub mod import_jobs;
pub mod leads;
pub mod promotion_order_items;
pub mod promotion_orders;
pub mod promotion_products;
pub mod saved_searches;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use billing_plans::Entity as BillingPlans;
pub use billing_snapshots::Entity as BillingSnapshots;
pub use cars::Entity as Cars;
pub use import_jobs::Entity as ImportJobs;
pub use leads::Entity as Leads;
pub use promotion_order_items::Entity as PromotionOrderItems;
pub use promotion_orders::Entity as PromotionOrders;
pub use promotion_products::Entity as PromotionProducts;
pub use saved_searches::Entity as SavedSearches;
pub use users::Entity as Users;
