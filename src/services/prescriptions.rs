use crate::{
    db::DbPool,
    entities::{
        patient::{self, Entity as Patient},
        physician::{self, Entity as Physician},
        prescription::{self, ActiveModel as PrescriptionActiveModel, Entity as Prescription},
        prescription_item::{self, Entity as PrescriptionItem},
        product::{self, Entity as Product},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{parse_priority, PrescriptionStatus, Priority},
};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePrescriptionRequest {
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub priority: Option<String>,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "A prescription needs at least one item"))]
    pub items: Vec<CreatePrescriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePrescriptionItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PendingQuery {
    pub priority: Option<String>,
    pub search: Option<String>,
    pub page: u64,
    pub limit: u64,
}

/// Prescription line enriched with live stock data.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionItemDetail {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity_prescribed: i32,
    pub quantity_dispensed: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub is_dispensed: bool,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
    /// Current quantity-on-hand of the referenced product
    pub available_stock: i32,
    /// Whether the remaining quantity can be covered by current stock
    pub sufficient_stock: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDetail {
    pub id: Uuid,
    pub prescription_no: String,
    pub status: PrescriptionStatus,
    pub priority: Priority,
    pub total_cost: Decimal,
    pub notes: Option<String>,
    pub patient: PartySummary,
    pub physician: PartySummary,
    pub items: Vec<PrescriptionItemDetail>,
    pub created_at: DateTime<Utc>,
    pub dispensed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: Uuid,
    pub prescription_no: String,
    pub status: PrescriptionStatus,
    pub priority: Priority,
    pub patient_name: String,
    pub total_cost: Decimal,
    pub item_count: usize,
    pub all_items_in_stock: bool,
    pub items: Vec<QueueItemFlag>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemFlag {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity_remaining: i32,
    pub available_stock: i32,
    pub sufficient_stock: bool,
    pub is_dispensed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCounts {
    pub emergency: u64,
    pub urgent: u64,
    pub normal: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage {
    pub prescriptions: Vec<QueueEntry>,
    pub priority_counts: PriorityCounts,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Sort expression realizing the emergency < urgent < normal queue order.
fn priority_rank_expr() -> SimpleExpr {
    Expr::case(
        Expr::col(prescription::Column::Priority).eq(Priority::Emergency.as_ref()),
        Expr::val(0),
    )
    .case(
        Expr::col(prescription::Column::Priority).eq(Priority::Urgent.as_ref()),
        Expr::val(1),
    )
    .finally(Expr::val(2))
    .into()
}

/// Prescription intake and read-side queue/detail views.
#[derive(Clone)]
pub struct PrescriptionService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl PrescriptionService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a prescription with its items, pricing each line from the
    /// current catalog and totalling the cost.
    #[instrument(skip(self, request), fields(patient_id = %request.patient_id))]
    pub async fn create_prescription(
        &self,
        request: CreatePrescriptionRequest,
    ) -> Result<PrescriptionDetail, ServiceError> {
        request.validate()?;

        let priority = match request.priority.as_deref() {
            Some(raw) => parse_priority(raw)?,
            None => Priority::Normal,
        };

        for item in &request.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(
                    "Prescribed quantity must be at least 1".to_string(),
                ));
            }
        }

        let db = &*self.db_pool;
        let prescription_id = Uuid::new_v4();

        let created_id = db
            .transaction::<_, Uuid, ServiceError>(move |txn| {
                Box::pin(async move {
                    let patient = Patient::find_by_id(request.patient_id)
                        .filter(patient::Column::IsDeleted.eq(false))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Patient {} not found",
                                request.patient_id
                            ))
                        })?;

                    Physician::find_by_id(request.physician_id)
                        .filter(physician::Column::IsDeleted.eq(false))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Physician {} not found",
                                request.physician_id
                            ))
                        })?;

                    let mut total_cost = Decimal::ZERO;
                    let mut lines = Vec::with_capacity(request.items.len());

                    for item in &request.items {
                        let drug = Product::find_by_id(item.product_id)
                            .filter(product::Column::IsDeleted.eq(false))
                            .one(txn)
                            .await?
                            .ok_or_else(|| {
                                ServiceError::ValidationError(format!(
                                    "Prescription references an unknown product ({})",
                                    item.product_id
                                ))
                            })?;

                        let unit_price = drug.price;
                        let total_price = unit_price * Decimal::from(item.quantity);
                        total_cost += total_price;

                        lines.push(prescription_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            prescription_id: Set(prescription_id),
                            product_id: Set(item.product_id),
                            quantity_prescribed: Set(item.quantity),
                            unit_price: Set(unit_price),
                            total_price: Set(total_price),
                            dosage: Set(item.dosage.clone()),
                            frequency: Set(item.frequency.clone()),
                            duration: Set(item.duration.clone()),
                            instructions: Set(item.instructions.clone()),
                            ..Default::default()
                        });
                    }

                    let now = Utc::now();
                    let prescription_no = format!(
                        "RX-{}-{:06}",
                        now.year(),
                        now.timestamp_millis() % 1_000_000
                    );

                    let header = PrescriptionActiveModel {
                        id: Set(prescription_id),
                        prescription_no: Set(prescription_no),
                        patient_id: Set(patient.id),
                        physician_id: Set(request.physician_id),
                        status: Set(PrescriptionStatus::Pending.to_string()),
                        priority: Set(priority.to_string()),
                        total_cost: Set(total_cost),
                        notes: Set(request.notes.clone()),
                        ..Default::default()
                    };
                    header.insert(txn).await?;

                    for line in lines {
                        line.insert(txn).await?;
                    }

                    Ok(prescription_id)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(prescription_id = %created_id, "Prescription created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PrescriptionCreated(created_id))
                .await
            {
                warn!(error = %e, "Failed to send prescription created event");
            }
        }

        self.get_prescription(created_id).await
    }

    /// Full prescription detail with patient, physician, and per-item
    /// stock data.
    #[instrument(skip(self), fields(prescription_id = %id))]
    pub async fn get_prescription(&self, id: Uuid) -> Result<PrescriptionDetail, ServiceError> {
        let db = &*self.db_pool;

        let header = Prescription::find_by_id(id)
            .filter(prescription::Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Prescription {} not found", id)))?;

        let patient = Patient::find_by_id(header.patient_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Patient {} not found", header.patient_id))
            })?;

        let physician = Physician::find_by_id(header.physician_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Physician {} not found", header.physician_id))
            })?;

        let items = PrescriptionItem::find()
            .filter(prescription_item::Column::PrescriptionId.eq(id))
            .order_by_asc(prescription_item::Column::CreatedAt)
            .all(db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let item_details = items
            .into_iter()
            .map(|item| {
                let (code, name, available) = products
                    .get(&item.product_id)
                    .map(|p| (p.code.clone(), p.name.clone(), p.quantity))
                    .unwrap_or_else(|| (String::new(), item.product_id.to_string(), 0));
                let remaining = item.remaining_quantity();

                PrescriptionItemDetail {
                    id: item.id,
                    product_id: item.product_id,
                    product_code: code,
                    product_name: name,
                    quantity_prescribed: item.quantity_prescribed,
                    quantity_dispensed: item.quantity_dispensed,
                    unit_price: item.unit_price,
                    total_price: item.total_price,
                    is_dispensed: item.is_dispensed,
                    dosage: item.dosage,
                    frequency: item.frequency,
                    duration: item.duration,
                    instructions: item.instructions,
                    available_stock: available,
                    sufficient_stock: item.is_dispensed || available >= remaining,
                }
            })
            .collect();

        Ok(PrescriptionDetail {
            id: header.id,
            prescription_no: header.prescription_no,
            status: crate::models::parse_prescription_status(&header.status)?,
            priority: parse_priority(&header.priority)?,
            total_cost: header.total_cost,
            notes: header.notes,
            patient: PartySummary {
                id: patient.id,
                name: patient.full_name(),
            },
            physician: PartySummary {
                id: physician.id,
                name: physician.full_name(),
            },
            items: item_details,
            created_at: header.created_at,
            dispensed_at: header.dispensed_at,
        })
    }

    /// The pharmacist work queue: prescriptions that still have items to
    /// dispense, ordered by priority then age, with stock-sufficiency flags.
    #[instrument(skip(self))]
    pub async fn pending_queue(&self, query: PendingQuery) -> Result<QueuePage, ServiceError> {
        let db = &*self.db_pool;

        let dispensable = [
            PrescriptionStatus::Pending.to_string(),
            PrescriptionStatus::PartiallyDispensed.to_string(),
        ];

        let mut condition = Condition::all()
            .add(prescription::Column::IsDeleted.eq(false))
            .add(prescription::Column::Status.is_in(dispensable.clone()));

        if let Some(raw) = query.priority.as_deref() {
            let priority = parse_priority(raw)?;
            condition = condition.add(prescription::Column::Priority.eq(priority.as_ref()));
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let matching_patients: Vec<Uuid> = Patient::find()
                .filter(
                    Condition::any()
                        .add(patient::Column::FirstName.contains(search))
                        .add(patient::Column::LastName.contains(search)),
                )
                .all(db)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();

            condition = condition.add(
                Condition::any()
                    .add(prescription::Column::PrescriptionNo.contains(search))
                    .add(prescription::Column::PatientId.is_in(matching_patients)),
            );
        }

        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);

        let paginator = Prescription::find()
            .filter(condition)
            .order_by(priority_rank_expr(), Order::Asc)
            .order_by(prescription::Column::CreatedAt, Order::Asc)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let headers = paginator.fetch_page(page - 1).await?;

        // Priority counts span the whole open queue, not just this page.
        let mut counts = PriorityCounts {
            emergency: 0,
            urgent: 0,
            normal: 0,
        };
        for priority in [Priority::Emergency, Priority::Urgent, Priority::Normal] {
            let count = Prescription::find()
                .filter(prescription::Column::IsDeleted.eq(false))
                .filter(prescription::Column::Status.is_in(dispensable.clone()))
                .filter(prescription::Column::Priority.eq(priority.as_ref()))
                .count(db)
                .await?;
            match priority {
                Priority::Emergency => counts.emergency = count,
                Priority::Urgent => counts.urgent = count,
                Priority::Normal => counts.normal = count,
            }
        }

        let prescription_ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let items = PrescriptionItem::find()
            .filter(prescription_item::Column::PrescriptionId.is_in(prescription_ids))
            .all(db)
            .await?;

        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products: HashMap<Uuid, product::Model> = Product::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let patient_ids: Vec<Uuid> = headers.iter().map(|h| h.patient_id).collect();
        let patients: HashMap<Uuid, patient::Model> = Patient::find()
            .filter(patient::Column::Id.is_in(patient_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut items_by_prescription: HashMap<Uuid, Vec<prescription_item::Model>> =
            HashMap::new();
        for item in items {
            items_by_prescription
                .entry(item.prescription_id)
                .or_default()
                .push(item);
        }

        let entries = headers
            .into_iter()
            .map(|header| {
                let lines = items_by_prescription.remove(&header.id).unwrap_or_default();
                let flags: Vec<QueueItemFlag> = lines
                    .iter()
                    .map(|item| {
                        let (name, available) = products
                            .get(&item.product_id)
                            .map(|p| (p.name.clone(), p.quantity))
                            .unwrap_or_else(|| (item.product_id.to_string(), 0));
                        let remaining = item.remaining_quantity();
                        QueueItemFlag {
                            id: item.id,
                            product_id: item.product_id,
                            product_name: name,
                            quantity_remaining: remaining,
                            available_stock: available,
                            sufficient_stock: item.is_dispensed || available >= remaining,
                            is_dispensed: item.is_dispensed,
                        }
                    })
                    .collect();

                let all_in_stock = flags.iter().all(|f| f.sufficient_stock);
                let patient_name = patients
                    .get(&header.patient_id)
                    .map(|p| p.full_name())
                    .unwrap_or_default();

                Ok(QueueEntry {
                    id: header.id,
                    prescription_no: header.prescription_no,
                    status: crate::models::parse_prescription_status(&header.status)?,
                    priority: parse_priority(&header.priority)?,
                    patient_name,
                    total_cost: header.total_cost,
                    item_count: flags.len(),
                    all_items_in_stock: all_in_stock,
                    items: flags,
                    created_at: header.created_at,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        Ok(QueuePage {
            prescriptions: entries,
            priority_counts: counts,
            total,
            page,
            limit,
        })
    }
}
