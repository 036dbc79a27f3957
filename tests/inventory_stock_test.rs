mod common;

use chrono::{Duration, Utc};
use common::*;
use pharmacy_api::{
    entities::{
        product::Entity as Product,
        stock_movement::{self, Entity as StockMovement},
    },
    errors::ServiceError,
    models::StockStatus,
    services::{
        drugs::UpdateDrugRequest,
        inventory::{AdjustStockRequest, StockQuery},
    },
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

#[tokio::test]
async fn stock_view_classifies_and_summarizes() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    drugs
        .create_drug(drug_request("OUT-1", "Out Of Stock Drug", 0, Some(10), dec!(1.00)))
        .await
        .unwrap();
    // reorder level absent: the default of 10 applies, 5 <= 10 -> low
    drugs
        .create_drug(drug_request("LOW-1", "Low Stock Drug", 5, None, dec!(1.00)))
        .await
        .unwrap();
    drugs
        .create_drug(drug_request("OK-1", "Healthy Drug", 50, Some(10), dec!(1.00)))
        .await
        .unwrap();

    let page = inventory_service(&db)
        .list_stock(StockQuery {
            page: 1,
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.summary.total_drugs, 3);
    assert_eq!(page.summary.out_of_stock, 1);
    assert_eq!(page.summary.low_stock, 1);
    assert_eq!(page.summary.in_stock, 1);
    assert_eq!(page.categories, vec!["Analgesics".to_string()]);

    let low = page
        .items
        .iter()
        .find(|item| item.code == "LOW-1")
        .unwrap();
    assert_eq!(low.stock_status, StockStatus::LowStock);
    assert_eq!(low.stock_percentage, 50);

    let out = page
        .items
        .iter()
        .find(|item| item.code == "OUT-1")
        .unwrap();
    assert_eq!(out.stock_status, StockStatus::OutOfStock);
    assert_eq!(out.stock_percentage, 0);

    let healthy = page.items.iter().find(|item| item.code == "OK-1").unwrap();
    assert_eq!(healthy.stock_status, StockStatus::Healthy);
    assert_eq!(healthy.stock_percentage, 100);
}

#[tokio::test]
async fn status_filter_returns_only_matching_rows() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    drugs
        .create_drug(drug_request("A-1", "Drug A", 0, Some(10), dec!(1.00)))
        .await
        .unwrap();
    drugs
        .create_drug(drug_request("B-1", "Drug B", 3, Some(10), dec!(1.00)))
        .await
        .unwrap();
    drugs
        .create_drug(drug_request("C-1", "Drug C", 99, Some(10), dec!(1.00)))
        .await
        .unwrap();

    let page = inventory_service(&db)
        .list_stock(StockQuery {
            status: Some(StockStatus::LowStock),
            page: 1,
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].code, "B-1");
    // The summary still spans the whole catalog
    assert_eq!(page.summary.total_drugs, 3);
}

#[tokio::test]
async fn search_matches_name_and_code() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    drugs
        .create_drug(drug_request("AMX-500", "Amoxicillin 500mg", 20, None, dec!(2.00)))
        .await
        .unwrap();
    drugs
        .create_drug(drug_request("IBU-200", "Ibuprofen 200mg", 20, None, dec!(1.00)))
        .await
        .unwrap();

    let service = inventory_service(&db);

    let by_name = service
        .list_stock(StockQuery {
            search: Some("amoxi".to_string()),
            page: 1,
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_name.items.len(), 1);
    assert_eq!(by_name.items[0].code, "AMX-500");

    let by_code = service
        .list_stock(StockQuery {
            search: Some("ibu-".to_string()),
            page: 1,
            limit: 20,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_code.items.len(), 1);
    assert_eq!(by_code.items[0].name, "Ibuprofen 200mg");
}

#[tokio::test]
async fn pagination_slices_after_filtering() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    for i in 0..5 {
        drugs
            .create_drug(drug_request(
                &format!("PAGE-{i}"),
                &format!("Paged Drug {i}"),
                50,
                Some(10),
                dec!(1.00),
            ))
            .await
            .unwrap();
    }

    let service = inventory_service(&db);
    let first = service
        .list_stock(StockQuery {
            page: 1,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total, 5);

    let last = service
        .list_stock(StockQuery {
            page: 3,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
}

#[tokio::test]
async fn expiring_soon_respects_the_window() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let soon = drugs
        .create_drug(drug_request("EXP-1", "Expiring Drug", 20, None, dec!(1.00)))
        .await
        .unwrap();
    let later = drugs
        .create_drug(drug_request("EXP-2", "Long Dated Drug", 20, None, dec!(1.00)))
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    drugs
        .update_drug(UpdateDrugRequest {
            id: soon.id,
            expiry_date: Some(today + Duration::days(10)),
            code: None,
            name: None,
            generic_name: None,
            brand_name: None,
            category: None,
            quantity: None,
            reorder_level: None,
            price: None,
            batch_number: None,
            unit: None,
            prescription_required: None,
        })
        .await
        .unwrap();
    drugs
        .update_drug(UpdateDrugRequest {
            id: later.id,
            expiry_date: Some(today + Duration::days(120)),
            code: None,
            name: None,
            generic_name: None,
            brand_name: None,
            category: None,
            quantity: None,
            reorder_level: None,
            price: None,
            batch_number: None,
            unit: None,
            prescription_required: None,
        })
        .await
        .unwrap();

    let expiring = inventory_service(&db).expiring_products().await.unwrap();
    assert_eq!(expiring.len(), 1);
    assert_eq!(expiring[0].code, "EXP-1");
    assert!(expiring[0].is_expiring_soon);
}

#[tokio::test]
async fn adjustment_persists_quantity_and_writes_the_ledger() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let product = drugs
        .create_drug(drug_request("ADJ-1", "Adjusted Drug", 12, Some(10), dec!(1.00)))
        .await
        .unwrap();

    let operator = Uuid::new_v4();
    let adjustment = inventory_service(&db)
        .adjust_stock(AdjustStockRequest {
            product_id: product.id,
            quantity: 40,
            reason: "Restock delivery".to_string(),
            adjusted_by: operator,
        })
        .await
        .unwrap();

    assert_eq!(adjustment.previous_quantity, 12);
    assert_eq!(adjustment.new_quantity, 40);
    assert_eq!(adjustment.delta, 28);

    let stored = Product::find_by_id(product.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.quantity, 40);

    let movements = StockMovement::find()
        .filter(stock_movement::Column::ProductId.eq(product.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    let movement = &movements[0];
    assert_eq!(movement.movement_type, "adjustment");
    assert_eq!(movement.quantity_change, 28);
    assert_eq!(movement.previous_quantity, 12);
    assert_eq!(movement.new_quantity, 40);
    assert_eq!(movement.reason.as_deref(), Some("Restock delivery"));
    assert_eq!(movement.created_by, Some(operator));
}

#[tokio::test]
async fn adjustment_requires_a_live_product_and_a_reason() {
    let db = setup_db().await;
    let service = inventory_service(&db);

    let err = service
        .adjust_stock(AdjustStockRequest {
            product_id: Uuid::new_v4(),
            quantity: 10,
            reason: "Count correction".to_string(),
            adjusted_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let drugs = drug_service(&db);
    let product = drugs
        .create_drug(drug_request("ADJ-2", "Another Drug", 5, None, dec!(1.00)))
        .await
        .unwrap();

    let err = service
        .adjust_stock(AdjustStockRequest {
            product_id: product.id,
            quantity: 10,
            reason: String::new(),
            adjusted_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    let err = service
        .adjust_stock(AdjustStockRequest {
            product_id: product.id,
            quantity: -3,
            reason: "Impossible".to_string(),
            adjusted_by: Uuid::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Failed attempts leave no ledger rows behind
    assert_eq!(StockMovement::find().all(db.as_ref()).await.unwrap().len(), 0);
}
