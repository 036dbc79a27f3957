pub mod common;
pub mod dashboard;
pub mod drugs;
pub mod inventory;
pub mod prescriptions;
pub mod users;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    dashboard::DashboardService, dispensing::DispensingService, drugs::DrugService,
    inventory::InventoryService, prescriptions::PrescriptionService, users::UserService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
/// Every service shares the single database pool; there is exactly one
/// storage configuration for the whole application.
#[derive(Clone)]
pub struct AppServices {
    pub drugs: Arc<DrugService>,
    pub inventory: Arc<InventoryService>,
    pub prescriptions: Arc<PrescriptionService>,
    pub dispensing: Arc<DispensingService>,
    pub dashboard: Arc<DashboardService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let inventory = InventoryService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
            config.into(),
        );

        Self {
            drugs: Arc::new(DrugService::new(db_pool.clone(), Some(event_sender.clone()))),
            inventory: Arc::new(inventory.clone()),
            prescriptions: Arc::new(PrescriptionService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            dispensing: Arc::new(DispensingService::new(
                db_pool.clone(),
                Some(event_sender.clone()),
            )),
            dashboard: Arc::new(DashboardService::new(db_pool.clone(), inventory)),
            users: Arc::new(UserService::new(db_pool, Some(event_sender))),
        }
    }
}
