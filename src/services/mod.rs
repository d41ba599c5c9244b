pub mod auth_service;
pub mod billing_service;
pub mod car_service;
pub mod import_service;
pub mod lead_service;
pub mod promotion_service;
pub mod saved_search_service;
