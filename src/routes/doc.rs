use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        CarStatus, ImportJobStatus, LeadSource, LeadStatus, PromotionKind, PromotionOrderStatus,
        Role,
        billing::{PlanTerms, RevenueReport, RevenueRow, UsageWarning, WarningLevel},
        listing::ListingDraft,
        search::CarSearchFilters,
    },
    dto::{
        FailedItem,
        auth::{LoginRequest, LoginResponse, RegisterRequest, UserList},
        billing::{
            BillingPlanList, CreateBillingPlanRequest, GenerateSnapshotsRequest, SnapshotRun,
            UpdateBillingPlanRequest, UpdateSubscriptionRequest, UsageSummary,
        },
        cars::{CarList, CreateCarRequest, UpdateCarRequest},
        import_jobs::{ImportJobDetail, ImportJobList, RowError, UploadImportRequest},
        leads::{
            CreateLeadRequest, LeadList, LeadStatsReport, LeadStatusCounts, SellerLeadStats,
            UpdateLeadStatusRequest,
        },
        promotions::{
            CreatePromotionOrderRequest, CreatePromotionProductRequest, OrderLine,
            PromotionOrderList, PromotionOrderWithItems, PromotionProductList,
        },
        saved_searches::{CreateSavedSearchRequest, SavedSearchList},
    },
    models::{
        BillingPlan, BillingSnapshot, Car, ImportJob, Lead, PromotionOrder, PromotionOrderItem,
        PromotionProduct, SavedSearch, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, billing_plans, cars, health, import_jobs, leads, me, promotions,
        saved_searches,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        me::profile,
        me::usage,
        me::my_cars,
        me::my_leads,
        cars::list_cars,
        cars::get_car,
        cars::create_car,
        cars::update_car,
        cars::delete_car,
        leads::create_lead,
        leads::update_lead_status,
        billing_plans::list_plans,
        promotions::list_products,
        promotions::create_order,
        promotions::list_orders,
        promotions::get_order,
        promotions::pay_order,
        promotions::cancel_order,
        import_jobs::upload,
        import_jobs::list_jobs,
        import_jobs::get_job,
        import_jobs::commit,
        saved_searches::create_saved,
        saved_searches::list_saved,
        saved_searches::delete_saved,
        admin::list_users,
        admin::update_subscription,
        admin::create_plan,
        admin::update_plan,
        admin::generate_snapshots,
        admin::revenue,
        admin::lead_stats,
        admin::create_promotion_product
    ),
    components(
        schemas(
            Role,
            LeadStatus,
            LeadSource,
            CarStatus,
            PromotionKind,
            PromotionOrderStatus,
            ImportJobStatus,
            PlanTerms,
            WarningLevel,
            UsageWarning,
            RevenueRow,
            RevenueReport,
            ListingDraft,
            CarSearchFilters,
            FailedItem,
            User,
            BillingPlan,
            Car,
            Lead,
            BillingSnapshot,
            PromotionProduct,
            PromotionOrder,
            PromotionOrderItem,
            ImportJob,
            SavedSearch,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UserList,
            CreateBillingPlanRequest,
            UpdateBillingPlanRequest,
            BillingPlanList,
            UpdateSubscriptionRequest,
            UsageSummary,
            GenerateSnapshotsRequest,
            SnapshotRun,
            CreateCarRequest,
            UpdateCarRequest,
            CarList,
            CreateLeadRequest,
            UpdateLeadStatusRequest,
            LeadList,
            LeadStatusCounts,
            SellerLeadStats,
            LeadStatsReport,
            CreatePromotionProductRequest,
            OrderLine,
            CreatePromotionOrderRequest,
            PromotionOrderWithItems,
            PromotionProductList,
            PromotionOrderList,
            UploadImportRequest,
            RowError,
            ImportJobDetail,
            ImportJobList,
            CreateSavedSearchRequest,
            SavedSearchList,
            Meta,
            ApiResponse<Car>,
            ApiResponse<CarList>,
            ApiResponse<Lead>,
            ApiResponse<UsageSummary>,
            ApiResponse<PromotionOrderWithItems>,
            ApiResponse<ImportJobDetail>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Me", description = "The caller's profile, usage and inventory"),
        (name = "Cars", description = "Car listings and search"),
        (name = "Leads", description = "Buyer contact requests"),
        (name = "Billing", description = "Billing plans"),
        (name = "Promotions", description = "Paid listing and brand promotions"),
        (name = "Import", description = "Bulk fleet import for yards"),
        (name = "Saved searches", description = "Stored search filters"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
