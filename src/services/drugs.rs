use crate::{
    db::DbPool,
    entities::{
        product::{self, ActiveModel as ProductActiveModel, Entity as Product, Model as ProductModel},
        stock_movement,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::MovementType,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateDrugRequest {
    #[validate(length(min = 1, message = "Drug code is required"))]
    pub code: String,
    #[validate(length(min = 1, message = "Drug name is required"))]
    pub name: String,
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    pub reorder_level: Option<i32>,
    pub price: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub unit: Option<String>,
    pub prescription_required: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateDrugRequest {
    pub id: Uuid,
    pub code: Option<String>,
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub reorder_level: Option<i32>,
    pub price: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub unit: Option<String>,
    pub prescription_required: Option<bool>,
}

/// Unit recorded when a drug is created without one.
const DEFAULT_UNIT: &str = "Pieces";

/// Catalog operations for drug products. Rows are soft-deleted only.
#[derive(Clone)]
pub struct DrugService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DrugService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists non-deleted drugs, newest first.
    #[instrument(skip(self))]
    pub async fn list_drugs(&self) -> Result<Vec<ProductModel>, ServiceError> {
        let db = &*self.db_pool;

        let drugs = Product::find()
            .filter(product::Column::IsDeleted.eq(false))
            .order_by_desc(product::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(drugs)
    }

    /// Fetches a single live drug by id.
    pub async fn get_drug(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        let db = &*self.db_pool;

        Product::find_by_id(id)
            .filter(product::Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Drug {} not found", id)))
    }

    /// Creates a drug; rejects a code already used by a live row.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn create_drug(
        &self,
        request: CreateDrugRequest,
    ) -> Result<ProductModel, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;

        let collision = Product::find()
            .filter(product::Column::Code.eq(request.code.clone()))
            .filter(product::Column::IsDeleted.eq(false))
            .one(db)
            .await?;

        if collision.is_some() {
            warn!(code = %request.code, "Drug code already in use");
            return Err(ServiceError::Conflict(format!(
                "A drug with code {} already exists",
                request.code
            )));
        }

        let drug_id = Uuid::new_v4();
        let drug = ProductActiveModel {
            id: Set(drug_id),
            code: Set(request.code),
            name: Set(request.name),
            generic_name: Set(request.generic_name),
            brand_name: Set(request.brand_name),
            category: Set(request.category),
            quantity: Set(request.quantity),
            reorder_level: Set(request.reorder_level),
            price: Set(request.price),
            expiry_date: Set(request.expiry_date),
            batch_number: Set(request.batch_number),
            unit: Set(request.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string())),
            prescription_required: Set(request.prescription_required.unwrap_or(false)),
            ..Default::default()
        };

        let model = drug.insert(db).await?;

        info!(drug_id = %drug_id, code = %model.code, "Drug created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::DrugCreated(drug_id)).await {
                warn!(error = %e, drug_id = %drug_id, "Failed to send drug created event");
            }
        }

        Ok(model)
    }

    /// Updates a drug by id; rejects a code collision with a different live row.
    #[instrument(skip(self, request), fields(drug_id = %request.id))]
    pub async fn update_drug(
        &self,
        request: UpdateDrugRequest,
    ) -> Result<ProductModel, ServiceError> {
        let db = &*self.db_pool;

        let existing = Product::find_by_id(request.id)
            .filter(product::Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Drug {} not found", request.id)))?;

        if let Some(code) = &request.code {
            let collision = Product::find()
                .filter(product::Column::Code.eq(code.clone()))
                .filter(product::Column::IsDeleted.eq(false))
                .filter(product::Column::Id.ne(request.id))
                .one(db)
                .await?;

            if collision.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "A drug with code {} already exists",
                    code
                )));
            }
        }

        if let Some(quantity) = request.quantity {
            if quantity < 0 {
                return Err(ServiceError::ValidationError(
                    "Quantity cannot be negative".to_string(),
                ));
            }
        }

        let previous_quantity = existing.quantity;
        let model = db
            .transaction::<_, ProductModel, ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut drug: ProductActiveModel = existing.into();
                    if let Some(code) = request.code {
                        drug.code = Set(code);
                    }
                    if let Some(name) = request.name {
                        drug.name = Set(name);
                    }
                    if let Some(generic_name) = request.generic_name {
                        drug.generic_name = Set(Some(generic_name));
                    }
                    if let Some(brand_name) = request.brand_name {
                        drug.brand_name = Set(Some(brand_name));
                    }
                    if let Some(category) = request.category {
                        drug.category = Set(category);
                    }
                    if let Some(quantity) = request.quantity {
                        drug.quantity = Set(quantity);
                    }
                    if let Some(reorder_level) = request.reorder_level {
                        drug.reorder_level = Set(Some(reorder_level));
                    }
                    if let Some(price) = request.price {
                        drug.price = Set(price);
                    }
                    if let Some(expiry_date) = request.expiry_date {
                        drug.expiry_date = Set(Some(expiry_date));
                    }
                    if let Some(batch_number) = request.batch_number {
                        drug.batch_number = Set(Some(batch_number));
                    }
                    if let Some(unit) = request.unit {
                        drug.unit = Set(unit);
                    }
                    if let Some(prescription_required) = request.prescription_required {
                        drug.prescription_required = Set(prescription_required);
                    }
                    drug.updated_at = Set(Some(Utc::now()));

                    let model = drug.update(txn).await?;

                    // A quantity edit through the catalog is still an
                    // inventory mutation, so it lands in the ledger too.
                    if model.quantity != previous_quantity {
                        let movement = stock_movement::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            product_id: Set(model.id),
                            movement_type: Set(MovementType::Adjustment.to_string()),
                            quantity_change: Set(model.quantity - previous_quantity),
                            previous_quantity: Set(previous_quantity),
                            new_quantity: Set(model.quantity),
                            reason: Set(Some("Catalog update".to_string())),
                            reference_id: Set(None),
                            reference_type: Set(Some("drug_update".to_string())),
                            created_by: Set(None),
                            ..Default::default()
                        };
                        movement.insert(txn).await?;
                    }

                    Ok(model)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(drug_id = %model.id, "Drug updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::DrugUpdated(model.id)).await {
                warn!(error = %e, drug_id = %model.id, "Failed to send drug updated event");
            }
        }

        Ok(model)
    }

    /// Soft-deletes a drug. The row stays behind with is_deleted = true.
    #[instrument(skip(self), fields(drug_id = %id))]
    pub async fn delete_drug(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let existing = Product::find_by_id(id)
            .filter(product::Column::IsDeleted.eq(false))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Drug {} not found", id)))?;

        let mut drug: ProductActiveModel = existing.into();
        drug.is_deleted = Set(true);
        drug.updated_at = Set(Some(Utc::now()));
        drug.update(db).await?;

        info!(drug_id = %id, "Drug soft-deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::DrugDeleted(id)).await {
                warn!(error = %e, drug_id = %id, "Failed to send drug deleted event");
            }
        }

        Ok(())
    }
}
