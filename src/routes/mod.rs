use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod billing_plans;
pub mod cars;
pub mod doc;
pub mod health;
pub mod import_jobs;
pub mod leads;
pub mod me;
pub mod params;
pub mod promotions;
pub mod saved_searches;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/me", me::router())
        .nest("/cars", cars::router())
        .nest("/leads", leads::router())
        .nest("/billing-plans", billing_plans::router())
        .nest("/promotions", promotions::router())
        .nest("/import-jobs", import_jobs::router())
        .nest("/saved-searches", saved_searches::router())
        .nest("/admin", admin::router())
}
