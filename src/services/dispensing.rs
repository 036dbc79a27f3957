use crate::{
    db::DbPool,
    entities::{
        balance_transaction, dispensal_item,
        drug_dispensal::ActiveModel as DispensalActiveModel,
        patient::Entity as Patient,
        prescription::{self, ActiveModel as PrescriptionActiveModel, Entity as Prescription},
        prescription_item::{self, Entity as PrescriptionItem},
        product::{self, Entity as Product},
        stock_movement,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{parse_prescription_status, BalanceEntryType, MovementType, PrescriptionStatus},
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DispenseRequest {
    #[validate(length(min = 1, message = "At least one item must be dispensed"))]
    pub items: Vec<DispenseItemRequest>,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    pub notes: Option<String>,
    pub dispensed_by: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispenseItemRequest {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Outcome of a completed dispensing transaction.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispensalReceipt {
    pub dispensal_no: String,
    pub prescription_no: String,
    pub patient_name: String,
    pub status: PrescriptionStatus,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    /// amount_paid - total_amount, floored at zero for display
    pub change: Decimal,
    pub dispensed_items: usize,
}

/// Executes the dispensing workflow: verify stock per line, decrement
/// inventory, mark items dispensed, advance the prescription status, write
/// the receipt and payment ledger rows. All of it commits or none of it.
#[derive(Clone)]
pub struct DispensingService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

struct TxnOutcome {
    receipt: DispensalReceipt,
    prescription_id: Uuid,
    dispensal_id: Uuid,
    fully_dispensed: bool,
}

impl DispensingService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(prescription_id = %prescription_id))]
    pub async fn dispense(
        &self,
        prescription_id: Uuid,
        request: DispenseRequest,
    ) -> Result<DispensalReceipt, ServiceError> {
        request.validate()?;

        if request.total_amount < Decimal::ZERO || request.amount_paid < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Amounts cannot be negative".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for item in &request.items {
            if !seen.insert(item.item_id) {
                return Err(ServiceError::ValidationError(format!(
                    "Item {} appears more than once in the dispense request",
                    item.item_id
                )));
            }
        }

        let db = &*self.db_pool;

        let outcome = db
            .transaction::<_, TxnOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = Prescription::find_by_id(prescription_id)
                        .filter(prescription::Column::IsDeleted.eq(false))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Prescription {} not found",
                                prescription_id
                            ))
                        })?;

                    let status = parse_prescription_status(&header.status)?;
                    if !status.is_dispensable() {
                        return Err(ServiceError::Conflict(format!(
                            "Prescription {} has already been dispensed",
                            header.prescription_no
                        )));
                    }

                    let lines = PrescriptionItem::find()
                        .filter(prescription_item::Column::PrescriptionId.eq(prescription_id))
                        .all(txn)
                        .await?;

                    let line_index: HashMap<Uuid, &prescription_item::Model> =
                        lines.iter().map(|l| (l.id, l)).collect();

                    // Validate every requested line before touching anything.
                    for requested in &request.items {
                        let line = line_index.get(&requested.item_id).ok_or_else(|| {
                            ServiceError::ValidationError(format!(
                                "Item {} does not belong to prescription {}",
                                requested.item_id, header.prescription_no
                            ))
                        })?;

                        if line.product_id != requested.product_id {
                            return Err(ServiceError::ValidationError(format!(
                                "Item {} does not reference product {}",
                                requested.item_id, requested.product_id
                            )));
                        }

                        if line.is_dispensed {
                            return Err(ServiceError::ValidationError(format!(
                                "Item {} has already been dispensed",
                                requested.item_id
                            )));
                        }

                        if requested.quantity < 1
                            || requested.quantity > line.quantity_prescribed
                        {
                            return Err(ServiceError::ValidationError(format!(
                                "Dispense quantity {} for item {} must be between 1 and the prescribed {}",
                                requested.quantity, requested.item_id, line.quantity_prescribed
                            )));
                        }
                    }

                    let now = Utc::now();
                    let dispensal_id = Uuid::new_v4();
                    let dispensal_no = format!(
                        "DISP-{}-{:06}",
                        now.year(),
                        now.timestamp_millis() % 1_000_000
                    );

                    let dispensal = DispensalActiveModel {
                        id: Set(dispensal_id),
                        dispensal_no: Set(dispensal_no.clone()),
                        prescription_id: Set(prescription_id),
                        total_amount: Set(request.total_amount),
                        amount_paid: Set(request.amount_paid),
                        payment_method: Set(request.payment_method.clone()),
                        notes: Set(request.notes.clone()),
                        dispensed_by: Set(request.dispensed_by),
                        ..Default::default()
                    };
                    dispensal.insert(txn).await?;

                    for requested in &request.items {
                        let line = line_index[&requested.item_id];

                        let drug = Product::find_by_id(requested.product_id)
                            .filter(product::Column::IsDeleted.eq(false))
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Product {} not found",
                                    requested.product_id
                                ))
                            })?;

                        if drug.quantity < requested.quantity {
                            return Err(ServiceError::InsufficientStock(format!(
                                "Insufficient stock for {}: available {}, required {}",
                                drug.name, drug.quantity, requested.quantity
                            )));
                        }

                        // Conditional decrement: the quantity guard repeats in
                        // SQL so two racing dispensations cannot both pass the
                        // check above against a stale row.
                        let result = Product::update_many()
                            .col_expr(
                                product::Column::Quantity,
                                Expr::col(product::Column::Quantity).sub(requested.quantity),
                            )
                            .col_expr(product::Column::UpdatedAt, Expr::value(now))
                            .filter(product::Column::Id.eq(requested.product_id))
                            .filter(product::Column::Quantity.gte(requested.quantity))
                            .exec(txn)
                            .await?;

                        if result.rows_affected == 0 {
                            return Err(ServiceError::InsufficientStock(format!(
                                "Insufficient stock for {}: available {}, required {}",
                                drug.name, drug.quantity, requested.quantity
                            )));
                        }

                        let movement = stock_movement::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            product_id: Set(requested.product_id),
                            movement_type: Set(MovementType::Dispense.to_string()),
                            quantity_change: Set(-requested.quantity),
                            previous_quantity: Set(drug.quantity),
                            new_quantity: Set(drug.quantity - requested.quantity),
                            reason: Set(Some(format!(
                                "Dispensed against {}",
                                header.prescription_no
                            ))),
                            reference_id: Set(Some(dispensal_id)),
                            reference_type: Set(Some("drug_dispensal".to_string())),
                            created_by: Set(Some(request.dispensed_by)),
                            ..Default::default()
                        };
                        movement.insert(txn).await?;

                        let mut item_active: prescription_item::ActiveModel =
                            (*line).clone().into();
                        item_active.quantity_dispensed = Set(requested.quantity);
                        item_active.is_dispensed = Set(true);
                        item_active.dispensed_at = Set(Some(now));
                        item_active.dispensed_by = Set(Some(request.dispensed_by));
                        item_active.updated_at = Set(Some(now));
                        item_active.update(txn).await?;

                        let receipt_line = dispensal_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            dispensal_id: Set(dispensal_id),
                            prescription_item_id: Set(requested.item_id),
                            product_id: Set(requested.product_id),
                            quantity: Set(requested.quantity),
                            unit_price: Set(line.unit_price),
                            total_price: Set(line.unit_price * Decimal::from(requested.quantity)),
                            ..Default::default()
                        };
                        receipt_line.insert(txn).await?;
                    }

                    let requested_ids: std::collections::HashSet<Uuid> =
                        request.items.iter().map(|i| i.item_id).collect();
                    let dispensed_count = lines
                        .iter()
                        .filter(|l| l.is_dispensed || requested_ids.contains(&l.id))
                        .count();
                    let fully_dispensed = dispensed_count == lines.len();

                    let new_status = if fully_dispensed {
                        PrescriptionStatus::Dispensed
                    } else {
                        PrescriptionStatus::PartiallyDispensed
                    };

                    let mut header_active: PrescriptionActiveModel = header.clone().into();
                    header_active.status = Set(new_status.to_string());
                    header_active.updated_at = Set(Some(now));
                    if fully_dispensed {
                        header_active.dispensed_at = Set(Some(now));
                        header_active.dispensed_by = Set(Some(request.dispensed_by));
                    }
                    header_active.update(txn).await?;

                    let our_patient = Patient::find_by_id(header.patient_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Patient {} not found",
                                header.patient_id
                            ))
                        })?;

                    if request.amount_paid > Decimal::ZERO {
                        let ledger_entry = balance_transaction::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            patient_id: Set(header.patient_id),
                            prescription_id: Set(Some(prescription_id)),
                            amount: Set(request.amount_paid),
                            transaction_type: Set(BalanceEntryType::Debit.to_string()),
                            payment_method: Set(request.payment_method.clone()),
                            description: Set(Some(format!(
                                "Payment for dispensal {}",
                                dispensal_no
                            ))),
                            ..Default::default()
                        };
                        ledger_entry.insert(txn).await?;
                    }

                    let change = (request.amount_paid - request.total_amount).max(Decimal::ZERO);

                    Ok(TxnOutcome {
                        receipt: DispensalReceipt {
                            dispensal_no,
                            prescription_no: header.prescription_no,
                            patient_name: our_patient.full_name(),
                            status: new_status,
                            total_amount: request.total_amount,
                            amount_paid: request.amount_paid,
                            change,
                            dispensed_items: request.items.len(),
                        },
                        prescription_id,
                        dispensal_id,
                        fully_dispensed,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            prescription_id = %outcome.prescription_id,
            dispensal_no = %outcome.receipt.dispensal_no,
            fully_dispensed = outcome.fully_dispensed,
            "Prescription dispensed"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PrescriptionDispensed {
                    prescription_id: outcome.prescription_id,
                    dispensal_id: outcome.dispensal_id,
                    fully_dispensed: outcome.fully_dispensed,
                })
                .await
            {
                warn!(error = %e, "Failed to send prescription dispensed event");
            }
        }

        Ok(outcome.receipt)
    }
}
