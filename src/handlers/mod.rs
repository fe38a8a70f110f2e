pub mod appointments;
pub mod businesses;
pub mod categories;
pub mod common;
pub mod customers;
pub mod distribution;
pub mod employees;
pub mod finance;
pub mod production;
pub mod products;
pub mod reports;
pub mod sales;
pub mod suppliers;

use crate::{
    auth::AuthenticatedUser,
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        appointments::AppointmentService,
        businesses::BusinessService,
        categories::CategoryService,
        customers::CustomerService,
        distribution::DistributionService,
        employees::EmployeeService,
        finance::{DebtService, ExpenditureService, FundingService},
        production::ProductionService,
        products::ProductService,
        reports::ReportService,
        sales::SalesService,
        suppliers::SupplierService,
    },
};
use axum::{routing::get, Json, Router};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub businesses: Arc<BusinessService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub customers: Arc<CustomerService>,
    pub suppliers: Arc<SupplierService>,
    pub employees: Arc<EmployeeService>,
    pub production: Arc<ProductionService>,
    pub distribution: Arc<DistributionService>,
    pub funding: Arc<FundingService>,
    pub expenditures: Arc<ExpenditureService>,
    pub debts: Arc<DebtService>,
    pub sales: Arc<SalesService>,
    pub reports: Arc<ReportService>,
    pub appointments: Arc<AppointmentService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        Self {
            businesses: Arc::new(BusinessService::new(
                db_pool.clone(),
                event_sender.clone(),
                config.default_currency.clone(),
            )),
            categories: Arc::new(CategoryService::new(db_pool.clone(), event_sender.clone())),
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender.clone())),
            customers: Arc::new(CustomerService::new(db_pool.clone(), event_sender.clone())),
            suppliers: Arc::new(SupplierService::new(db_pool.clone(), event_sender.clone())),
            employees: Arc::new(EmployeeService::new(db_pool.clone(), event_sender.clone())),
            production: Arc::new(ProductionService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            distribution: Arc::new(DistributionService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            funding: Arc::new(FundingService::new(db_pool.clone(), event_sender.clone())),
            expenditures: Arc::new(ExpenditureService::new(
                db_pool.clone(),
                event_sender.clone(),
            )),
            debts: Arc::new(DebtService::new(db_pool.clone(), event_sender.clone())),
            sales: Arc::new(SalesService::new(db_pool.clone(), event_sender.clone())),
            reports: Arc::new(ReportService::new(db_pool.clone())),
            appointments: Arc::new(AppointmentService::new(
                db_pool,
                event_sender,
                config.default_slot_minutes,
            )),
        }
    }
}

/// Identity of the bearer token's subject
async fn me(user: AuthenticatedUser) -> Json<AuthenticatedUser> {
    Json(user)
}

/// Every authenticated `/api/v1` route, before the auth layer is applied
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .merge(businesses::routes())
        .merge(categories::routes())
        .merge(products::routes())
        .merge(customers::routes())
        .merge(suppliers::routes())
        .merge(employees::routes())
        .merge(production::routes())
        .merge(distribution::routes())
        .merge(finance::routes())
        .merge(sales::routes())
        .merge(reports::routes())
        .merge(appointments::routes())
}
