mod common;

use common::*;
use pharmacy_api::{
    entities::{
        balance_transaction::Entity as BalanceTransaction,
        dispensal_item::Entity as DispensalItem,
        drug_dispensal::Entity as DrugDispensal,
        prescription::Entity as Prescription,
        prescription_item::Entity as PrescriptionItem,
        product::Entity as Product,
        stock_movement::{self, Entity as StockMovement},
    },
    errors::ServiceError,
    models::PrescriptionStatus,
    services::dispensing::{DispenseItemRequest, DispenseRequest},
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn dispense_request(
    items: Vec<DispenseItemRequest>,
    total: rust_decimal::Decimal,
    paid: rust_decimal::Decimal,
) -> DispenseRequest {
    DispenseRequest {
        items,
        total_amount: total,
        amount_paid: paid,
        payment_method: "cash".to_string(),
        notes: None,
        dispensed_by: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn dispensing_all_items_completes_the_prescription() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let amoxicillin = drugs
        .create_drug(drug_request("AMX-500", "Amoxicillin 500mg", 20, Some(10), dec!(2.50)))
        .await
        .unwrap();
    let ibuprofen = drugs
        .create_drug(drug_request("IBU-200", "Ibuprofen 200mg", 30, Some(10), dec!(1.00)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Jordan", "Reyes").await;
    let physician = seed_physician(&db, "Alex", "Okafor").await;
    let prescription = seed_prescription(
        &db,
        patient.id,
        physician.id,
        None,
        &[(amoxicillin.id, 10), (ibuprofen.id, 5)],
    )
    .await;

    let receipt = dispensing_service(&db)
        .dispense(
            prescription.id,
            dispense_request(
                prescription
                    .items
                    .iter()
                    .map(|item| DispenseItemRequest {
                        item_id: item.id,
                        product_id: item.product_id,
                        quantity: item.quantity_prescribed,
                    })
                    .collect(),
                dec!(30.00),
                dec!(50.00),
            ),
        )
        .await
        .unwrap();

    assert!(receipt.dispensal_no.starts_with("DISP-"));
    assert_eq!(receipt.prescription_no, prescription.prescription_no);
    assert_eq!(receipt.patient_name, "Jordan Reyes");
    assert_eq!(receipt.status, PrescriptionStatus::Dispensed);
    assert_eq!(receipt.change, dec!(20.00));
    assert_eq!(receipt.dispensed_items, 2);

    // Inventory moved
    let amx = Product::find_by_id(amoxicillin.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(amx.quantity, 10);
    let ibu = Product::find_by_id(ibuprofen.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ibu.quantity, 25);

    // Header fully dispensed
    let header = Prescription::find_by_id(prescription.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.status, "dispensed");
    assert!(header.dispensed_at.is_some());
    assert!(header.dispensed_by.is_some());

    // Items marked
    let items = PrescriptionItem::find()
        .filter(pharmacy_api::entities::prescription_item::Column::PrescriptionId.eq(prescription.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert!(items.iter().all(|i| i.is_dispensed));
    assert!(items
        .iter()
        .all(|i| i.quantity_dispensed == i.quantity_prescribed));

    // One receipt with two lines, one movement per line
    assert_eq!(DrugDispensal::find().count(db.as_ref()).await.unwrap(), 1);
    assert_eq!(DispensalItem::find().count(db.as_ref()).await.unwrap(), 2);
    let movements = StockMovement::find()
        .filter(stock_movement::Column::MovementType.eq("dispense"))
        .all(db.as_ref())
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements.iter().all(|m| m.quantity_change < 0));
    assert!(movements
        .iter()
        .all(|m| m.new_quantity == m.previous_quantity + m.quantity_change));

    // Payment recorded
    assert_eq!(
        BalanceTransaction::find().count(db.as_ref()).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn dispensing_a_subset_leaves_the_prescription_partial() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let product_a = drugs
        .create_drug(drug_request("PARA-500", "Paracetamol 500mg", 5, Some(10), dec!(0.50)))
        .await
        .unwrap();
    let product_b = drugs
        .create_drug(drug_request("CET-10", "Cetirizine 10mg", 8, Some(10), dec!(0.75)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Sam", "Castillo").await;
    let physician = seed_physician(&db, "Rory", "Mwangi").await;
    let prescription = seed_prescription(
        &db,
        patient.id,
        physician.id,
        None,
        &[(product_a.id, 3), (product_b.id, 2)],
    )
    .await;

    let first_item = prescription
        .items
        .iter()
        .find(|i| i.product_id == product_a.id)
        .unwrap();

    let receipt = dispensing_service(&db)
        .dispense(
            prescription.id,
            dispense_request(
                vec![DispenseItemRequest {
                    item_id: first_item.id,
                    product_id: product_a.id,
                    quantity: 3,
                }],
                dec!(1.50),
                dec!(1.50),
            ),
        )
        .await
        .unwrap();

    assert_eq!(receipt.status, PrescriptionStatus::PartiallyDispensed);
    assert_eq!(receipt.change, dec!(0));

    let stock = Product::find_by_id(product_a.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 2);

    let header = Prescription::find_by_id(prescription.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.status, "partially_dispensed");
    assert!(header.dispensed_at.is_none());

    let dispensals = DrugDispensal::find().all(db.as_ref()).await.unwrap();
    assert_eq!(dispensals.len(), 1);
    assert_eq!(DispensalItem::find().count(db.as_ref()).await.unwrap(), 1);
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    // Both lines draw on the same product; together they exceed stock, so
    // the second decrement must fail and undo the first.
    let product = drugs
        .create_drug(drug_request("MET-850", "Metformin 850mg", 5, Some(10), dec!(1.20)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Ira", "Sandoval").await;
    let physician = seed_physician(&db, "Dana", "Petrov").await;
    let prescription = seed_prescription(
        &db,
        patient.id,
        physician.id,
        None,
        &[(product.id, 3), (product.id, 4)],
    )
    .await;

    let err = dispensing_service(&db)
        .dispense(
            prescription.id,
            dispense_request(
                prescription
                    .items
                    .iter()
                    .map(|item| DispenseItemRequest {
                        item_id: item.id,
                        product_id: item.product_id,
                        quantity: item.quantity_prescribed,
                    })
                    .collect(),
                dec!(8.40),
                dec!(8.40),
            ),
        )
        .await
        .unwrap_err();

    match err {
        ServiceError::InsufficientStock(msg) => {
            assert!(msg.contains("Metformin 850mg"));
            assert!(msg.contains("required"));
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }

    // Nothing changed
    let stock = Product::find_by_id(product.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 5);

    let header = Prescription::find_by_id(prescription.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.status, "pending");

    let items = PrescriptionItem::find()
        .filter(pharmacy_api::entities::prescription_item::Column::PrescriptionId.eq(prescription.id))
        .all(db.as_ref())
        .await
        .unwrap();
    assert!(items.iter().all(|i| !i.is_dispensed));
    assert!(items.iter().all(|i| i.quantity_dispensed == 0));

    assert_eq!(DrugDispensal::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(StockMovement::find().count(db.as_ref()).await.unwrap(), 0);
    assert_eq!(
        BalanceTransaction::find().count(db.as_ref()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn dispensing_a_dispensed_prescription_is_a_conflict() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let product = drugs
        .create_drug(drug_request("OME-20", "Omeprazole 20mg", 50, Some(10), dec!(0.80)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Noa", "Lindqvist").await;
    let physician = seed_physician(&db, "Kim", "Haddad").await;
    let prescription =
        seed_prescription(&db, patient.id, physician.id, None, &[(product.id, 5)]).await;

    let service = dispensing_service(&db);
    let items: Vec<DispenseItemRequest> = prescription
        .items
        .iter()
        .map(|item| DispenseItemRequest {
            item_id: item.id,
            product_id: item.product_id,
            quantity: item.quantity_prescribed,
        })
        .collect();

    service
        .dispense(
            prescription.id,
            dispense_request(items.clone(), dec!(4.00), dec!(4.00)),
        )
        .await
        .unwrap();

    let err = service
        .dispense(
            prescription.id,
            dispense_request(items, dec!(4.00), dec!(4.00)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));

    // No second receipt, no double decrement
    assert_eq!(DrugDispensal::find().count(db.as_ref()).await.unwrap(), 1);
    let stock = Product::find_by_id(product.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 45);
}

#[tokio::test]
async fn unknown_item_rejects_the_whole_operation() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let product = drugs
        .create_drug(drug_request("ASP-100", "Aspirin 100mg", 40, Some(10), dec!(0.30)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Vik", "Osei").await;
    let physician = seed_physician(&db, "Lee", "Brandt").await;
    let prescription =
        seed_prescription(&db, patient.id, physician.id, None, &[(product.id, 4)]).await;

    let real_item = &prescription.items[0];
    let err = dispensing_service(&db)
        .dispense(
            prescription.id,
            dispense_request(
                vec![
                    DispenseItemRequest {
                        item_id: real_item.id,
                        product_id: product.id,
                        quantity: 4,
                    },
                    DispenseItemRequest {
                        item_id: Uuid::new_v4(),
                        product_id: product.id,
                        quantity: 1,
                    },
                ],
                dec!(1.50),
                dec!(1.50),
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ValidationError(_)));

    let stock = Product::find_by_id(product.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 40);
    assert_eq!(DrugDispensal::find().count(db.as_ref()).await.unwrap(), 0);
}

#[tokio::test]
async fn a_partial_prescription_can_be_completed_later() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let product_a = drugs
        .create_drug(drug_request("LIS-10", "Lisinopril 10mg", 25, Some(10), dec!(0.90)))
        .await
        .unwrap();
    let product_b = drugs
        .create_drug(drug_request("ATO-20", "Atorvastatin 20mg", 25, Some(10), dec!(1.10)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Rin", "Takahashi").await;
    let physician = seed_physician(&db, "Mo", "Adler").await;
    let prescription = seed_prescription(
        &db,
        patient.id,
        physician.id,
        None,
        &[(product_a.id, 5), (product_b.id, 5)],
    )
    .await;

    let service = dispensing_service(&db);
    let item_a = prescription
        .items
        .iter()
        .find(|i| i.product_id == product_a.id)
        .unwrap();
    let item_b = prescription
        .items
        .iter()
        .find(|i| i.product_id == product_b.id)
        .unwrap();

    let first = service
        .dispense(
            prescription.id,
            dispense_request(
                vec![DispenseItemRequest {
                    item_id: item_a.id,
                    product_id: product_a.id,
                    quantity: 5,
                }],
                dec!(4.50),
                dec!(4.50),
            ),
        )
        .await
        .unwrap();
    assert_eq!(first.status, PrescriptionStatus::PartiallyDispensed);

    // Re-dispensing the finished line is rejected
    let err = service
        .dispense(
            prescription.id,
            dispense_request(
                vec![DispenseItemRequest {
                    item_id: item_a.id,
                    product_id: product_a.id,
                    quantity: 5,
                }],
                dec!(4.50),
                dec!(4.50),
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    // Completing the remaining line finishes the prescription
    let second = service
        .dispense(
            prescription.id,
            dispense_request(
                vec![DispenseItemRequest {
                    item_id: item_b.id,
                    product_id: product_b.id,
                    quantity: 5,
                }],
                dec!(5.50),
                dec!(5.50),
            ),
        )
        .await
        .unwrap();
    assert_eq!(second.status, PrescriptionStatus::Dispensed);

    let header = Prescription::find_by_id(prescription.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(header.status, "dispensed");
    assert_eq!(DrugDispensal::find().count(db.as_ref()).await.unwrap(), 2);
}

#[tokio::test]
async fn over_prescribed_quantity_is_rejected() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let product = drugs
        .create_drug(drug_request("AML-5", "Amlodipine 5mg", 100, Some(10), dec!(0.60)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Bea", "Nowak").await;
    let physician = seed_physician(&db, "Gil", "Moreau").await;
    let prescription =
        seed_prescription(&db, patient.id, physician.id, None, &[(product.id, 3)]).await;

    let item = &prescription.items[0];
    let err = dispensing_service(&db)
        .dispense(
            prescription.id,
            dispense_request(
                vec![DispenseItemRequest {
                    item_id: item.id,
                    product_id: product.id,
                    quantity: 4,
                }],
                dec!(2.40),
                dec!(2.40),
            ),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ValidationError(_)));

    let stock = Product::find_by_id(product.id)
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 100);
}

#[tokio::test]
async fn zero_payment_skips_the_balance_ledger() {
    let db = setup_db().await;
    let drugs = drug_service(&db);

    let product = drugs
        .create_drug(drug_request("VIT-D3", "Vitamin D3", 60, Some(10), dec!(0.25)))
        .await
        .unwrap();

    let patient = seed_patient(&db, "Oli", "Ferrara").await;
    let physician = seed_physician(&db, "Nat", "Kovacs").await;
    let prescription =
        seed_prescription(&db, patient.id, physician.id, None, &[(product.id, 10)]).await;

    let item = &prescription.items[0];
    let receipt = dispensing_service(&db)
        .dispense(
            prescription.id,
            dispense_request(
                vec![DispenseItemRequest {
                    item_id: item.id,
                    product_id: product.id,
                    quantity: 10,
                }],
                dec!(2.50),
                dec!(0),
            ),
        )
        .await
        .unwrap();

    assert_eq!(receipt.change, dec!(0));
    assert_eq!(
        BalanceTransaction::find().count(db.as_ref()).await.unwrap(),
        0
    );
}
