#![allow(dead_code)]

use pharmacy_api::{
    db::{establish_connection_with_config, run_migrations, DbConfig, DbPool},
    entities::{patient, physician},
    services::{
        dispensing::DispensingService,
        drugs::{CreateDrugRequest, DrugService},
        inventory::{InventoryService, StockSettings},
        prescriptions::{
            CreatePrescriptionItem, CreatePrescriptionRequest, PrescriptionDetail,
            PrescriptionService,
        },
    },
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

/// Fresh single-connection in-memory database with the full schema.
/// One connection keeps every query of a test on the same sqlite handle.
pub async fn setup_db() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };

    let pool = establish_connection_with_config(&config)
        .await
        .expect("Failed to create in-memory database");
    run_migrations(&pool).await.expect("Failed to run migrations");

    Arc::new(pool)
}

pub fn test_settings() -> StockSettings {
    StockSettings {
        default_reorder_level: 10,
        expiry_warning_days: 30,
    }
}

pub fn drug_service(db: &Arc<DbPool>) -> DrugService {
    DrugService::new(db.clone(), None)
}

pub fn inventory_service(db: &Arc<DbPool>) -> InventoryService {
    InventoryService::new(db.clone(), None, test_settings())
}

pub fn prescription_service(db: &Arc<DbPool>) -> PrescriptionService {
    PrescriptionService::new(db.clone(), None)
}

pub fn dispensing_service(db: &Arc<DbPool>) -> DispensingService {
    DispensingService::new(db.clone(), None)
}

/// Shorthand drug request: everything defaulted except the parts tests vary.
pub fn drug_request(
    code: &str,
    name: &str,
    quantity: i32,
    reorder_level: Option<i32>,
    price: Decimal,
) -> CreateDrugRequest {
    CreateDrugRequest {
        code: code.to_string(),
        name: name.to_string(),
        generic_name: None,
        brand_name: None,
        category: "Analgesics".to_string(),
        quantity,
        reorder_level,
        price,
        expiry_date: None,
        batch_number: None,
        unit: None,
        prescription_required: None,
    }
}

pub async fn seed_patient(db: &Arc<DbPool>, first_name: &str, last_name: &str) -> patient::Model {
    patient::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        phone: Set(None),
        ..Default::default()
    }
    .insert(db.as_ref())
    .await
    .expect("Failed to seed patient")
}

pub async fn seed_physician(db: &Arc<DbPool>, first_name: &str, last_name: &str) -> physician::Model {
    physician::ActiveModel {
        id: Set(Uuid::new_v4()),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        specialty: Set(Some("General".to_string())),
        ..Default::default()
    }
    .insert(db.as_ref())
    .await
    .expect("Failed to seed physician")
}

/// Creates a pending prescription for the given (product_id, quantity)
/// pairs through the intake service.
pub async fn seed_prescription(
    db: &Arc<DbPool>,
    patient_id: Uuid,
    physician_id: Uuid,
    priority: Option<&str>,
    lines: &[(Uuid, i32)],
) -> PrescriptionDetail {
    let service = prescription_service(db);
    service
        .create_prescription(CreatePrescriptionRequest {
            patient_id,
            physician_id,
            priority: priority.map(str::to_string),
            notes: None,
            items: lines
                .iter()
                .map(|(product_id, quantity)| CreatePrescriptionItem {
                    product_id: *product_id,
                    quantity: *quantity,
                    dosage: None,
                    frequency: None,
                    duration: None,
                    instructions: None,
                })
                .collect(),
        })
        .await
        .expect("Failed to seed prescription")
}
