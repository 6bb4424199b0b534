pub mod auth;
pub mod common;
pub mod dashboard;
pub mod debts;
pub mod expenses;
pub mod products;
pub mod reports;
pub mod sales;

use crate::{
    cache::CacheBackend,
    db::DbPool,
    services::{
        dashboard::DashboardService, debts::DebtService, expenses::ExpenseService,
        products::ProductService, reports::ReportService, sales::SaleService,
    },
};
use std::sync::Arc;
use std::time::Duration;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub sales: Arc<SaleService>,
    pub expenses: Arc<ExpenseService>,
    pub debts: Arc<DebtService>,
    pub dashboard: Arc<DashboardService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, cache: Arc<dyn CacheBackend>, cache_ttl: Duration) -> Self {
        Self {
            products: Arc::new(ProductService::new(db_pool.clone(), cache, cache_ttl)),
            sales: Arc::new(SaleService::new(db_pool.clone())),
            expenses: Arc::new(ExpenseService::new(db_pool.clone())),
            debts: Arc::new(DebtService::new(db_pool.clone())),
            dashboard: Arc::new(DashboardService::new(db_pool.clone())),
            reports: Arc::new(ReportService::new(db_pool)),
        }
    }
}
