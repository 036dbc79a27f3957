mod common;

use common::*;
use pharmacy_api::{
    services::{
        dashboard::DashboardService,
        dispensing::{DispenseItemRequest, DispenseRequest},
    },
};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn dashboard_service(db: &std::sync::Arc<pharmacy_api::db::DbPool>) -> DashboardService {
    DashboardService::new(db.clone(), inventory_service(db))
}

#[tokio::test]
async fn overview_reflects_queue_inventory_and_activity() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let healthy = drugs
        .create_drug(drug_request("DASH-1", "Well Stocked", 80, Some(10), dec!(1.00)))
        .await
        .unwrap();
    drugs
        .create_drug(drug_request("DASH-2", "Running Low", 3, Some(10), dec!(1.00)))
        .await
        .unwrap();
    drugs
        .create_drug(drug_request("DASH-3", "All Gone", 0, Some(10), dec!(1.00)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Dana", "Whitfield").await;
    let physician = seed_physician(&db, "Doc", "Varga").await;

    let urgent = seed_prescription(
        &db,
        patient.id,
        physician.id,
        Some("urgent"),
        &[(healthy.id, 2)],
    )
    .await;
    seed_prescription(
        &db,
        patient.id,
        physician.id,
        Some("emergency"),
        &[(healthy.id, 1)],
    )
    .await;

    // Dispense the urgent one so today's stats have activity.
    dispensing_service(&db)
        .dispense(
            urgent.id,
            DispenseRequest {
                items: vec![DispenseItemRequest {
                    item_id: urgent.items[0].id,
                    product_id: healthy.id,
                    quantity: 2,
                }],
                total_amount: dec!(2.00),
                amount_paid: dec!(2.00),
                payment_method: "cash".to_string(),
                notes: None,
                dispensed_by: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

    let overview = dashboard_service(&db).overview().await.unwrap();

    assert_eq!(overview.today.dispensal_count, 1);
    assert_eq!(overview.today.revenue, dec!(2.00));

    // Only the emergency prescription is still open
    assert_eq!(overview.pending.total, 1);
    assert_eq!(overview.pending.emergency, 1);
    assert_eq!(overview.pending.urgent, 0);

    assert_eq!(overview.top_priority.len(), 1);
    assert_eq!(
        overview.top_priority[0].priority,
        pharmacy_api::models::Priority::Emergency
    );

    // Low and out-of-stock drugs surface as alerts
    let alert_codes: Vec<&str> = overview
        .inventory_alerts
        .low_stock
        .iter()
        .map(|item| item.code.as_str())
        .collect();
    assert!(alert_codes.contains(&"DASH-2"));
    assert!(alert_codes.contains(&"DASH-3"));
    assert!(!alert_codes.contains(&"DASH-1"));

    assert_eq!(overview.recent_dispensals.len(), 1);
    assert!(overview.recent_dispensals[0]
        .dispensal_no
        .starts_with("DISP-"));
}

#[tokio::test]
async fn empty_facility_produces_a_quiet_dashboard() {
    let db = setup_db().await;

    let overview = dashboard_service(&db).overview().await.unwrap();

    assert_eq!(overview.today.dispensal_count, 0);
    assert_eq!(overview.today.revenue, dec!(0));
    assert_eq!(overview.pending.total, 0);
    assert!(overview.top_priority.is_empty());
    assert!(overview.inventory_alerts.low_stock.is_empty());
    assert!(overview.inventory_alerts.expiring_soon.is_empty());
    assert!(overview.recent_dispensals.is_empty());
}
