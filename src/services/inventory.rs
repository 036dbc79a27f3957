use crate::{
    config::AppConfig,
    db::DbPool,
    entities::{
        product::{self, ActiveModel as ProductActiveModel, Entity as Product, Model as ProductModel},
        stock_movement,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    models::{MovementType, StockStatus},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Thresholds that drive stock classification, sourced from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StockSettings {
    pub default_reorder_level: i32,
    pub expiry_warning_days: i64,
}

impl From<&AppConfig> for StockSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            default_reorder_level: cfg.default_reorder_level,
            expiry_warning_days: cfg.expiry_warning_days,
        }
    }
}

/// Classifies quantity-on-hand against a reorder threshold.
pub fn stock_status(quantity: i32, reorder_level: Option<i32>, default_level: i32) -> StockStatus {
    let threshold = reorder_level.unwrap_or(default_level);
    if quantity <= 0 {
        StockStatus::OutOfStock
    } else if quantity <= threshold {
        StockStatus::LowStock
    } else {
        StockStatus::Healthy
    }
}

/// Fill percentage for display, capped at 100.
pub fn stock_percentage(quantity: i32, reorder_level: Option<i32>, default_level: i32) -> i32 {
    let threshold = reorder_level.unwrap_or(default_level).max(1);
    let quantity = quantity.max(0) as i64;
    ((quantity * 100) / threshold as i64).min(100) as i32
}

/// True when the expiry date falls inside the warning window from `today`.
pub fn is_expiring_soon(expiry_date: Option<NaiveDate>, today: NaiveDate, window_days: i64) -> bool {
    match expiry_date {
        Some(expiry) => expiry <= today + chrono::Duration::days(window_days),
        None => false,
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StockQuery {
    pub category: Option<String>,
    pub status: Option<StockStatus>,
    pub search: Option<String>,
    pub page: u64,
    pub limit: u64,
}

/// One product row of the stock view, with computed classification fields.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub reorder_level: Option<i32>,
    pub price: rust_decimal::Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub unit: String,
    pub stock_status: StockStatus,
    pub stock_percentage: i32,
    pub is_expiring_soon: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total_drugs: u64,
    pub in_stock: u64,
    pub low_stock: u64,
    pub out_of_stock: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPage {
    pub items: Vec<StockItem>,
    pub summary: StockSummary,
    pub categories: Vec<String>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockRequest {
    pub product_id: Uuid,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    #[validate(length(min = 1, message = "A reason is required for stock adjustments"))]
    pub reason: String,
    pub adjusted_by: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub product_id: Uuid,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub delta: i32,
}

/// Stock views and manual quantity corrections.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    settings: StockSettings,
}

impl InventoryService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        settings: StockSettings,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            settings,
        }
    }

    pub fn settings(&self) -> StockSettings {
        self.settings
    }

    fn to_stock_item(&self, model: ProductModel, today: NaiveDate) -> StockItem {
        let status = stock_status(
            model.quantity,
            model.reorder_level,
            self.settings.default_reorder_level,
        );
        let percentage = stock_percentage(
            model.quantity,
            model.reorder_level,
            self.settings.default_reorder_level,
        );
        let expiring = is_expiring_soon(model.expiry_date, today, self.settings.expiry_warning_days);

        StockItem {
            id: model.id,
            code: model.code,
            name: model.name,
            generic_name: model.generic_name,
            brand_name: model.brand_name,
            category: model.category,
            quantity: model.quantity,
            reorder_level: model.reorder_level,
            price: model.price,
            expiry_date: model.expiry_date,
            batch_number: model.batch_number,
            unit: model.unit,
            stock_status: status,
            stock_percentage: percentage,
            is_expiring_soon: expiring,
        }
    }

    /// Filtered, paginated stock view. The summary and category list span
    /// the whole live catalog; status filtering happens on the computed
    /// classification, so the page is sliced after classification.
    #[instrument(skip(self))]
    pub async fn list_stock(&self, query: StockQuery) -> Result<StockPage, ServiceError> {
        let db = &*self.db_pool;
        let today = Utc::now().date_naive();

        let all = Product::find()
            .filter(product::Column::IsDeleted.eq(false))
            .order_by_desc(product::Column::CreatedAt)
            .all(db)
            .await?;

        let summary = {
            let mut summary = StockSummary {
                total_drugs: all.len() as u64,
                in_stock: 0,
                low_stock: 0,
                out_of_stock: 0,
            };
            for model in &all {
                match stock_status(
                    model.quantity,
                    model.reorder_level,
                    self.settings.default_reorder_level,
                ) {
                    StockStatus::Healthy => summary.in_stock += 1,
                    StockStatus::LowStock => summary.low_stock += 1,
                    StockStatus::OutOfStock => summary.out_of_stock += 1,
                }
            }
            summary
        };

        let mut categories: Vec<String> = all.iter().map(|m| m.category.clone()).collect();
        categories.sort();
        categories.dedup();

        let search = query.search.as_deref().map(str::to_lowercase);
        let items: Vec<StockItem> = all
            .into_iter()
            .filter(|m| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |c| m.category.eq_ignore_ascii_case(c))
            })
            .filter(|m| {
                search.as_deref().map_or(true, |s| {
                    m.name.to_lowercase().contains(s)
                        || m.code.to_lowercase().contains(s)
                        || m.generic_name
                            .as_deref()
                            .map_or(false, |g| g.to_lowercase().contains(s))
                })
            })
            .map(|m| self.to_stock_item(m, today))
            .filter(|item| query.status.map_or(true, |s| item.stock_status == s))
            .collect();

        let total = items.len() as u64;
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, 100);
        let offset = ((page - 1) * limit) as usize;
        let items = items
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();

        Ok(StockPage {
            items,
            summary,
            categories,
            total,
            page,
            limit,
        })
    }

    /// Live products classified low or out of stock, for dashboard alerts.
    pub async fn low_stock_products(&self) -> Result<Vec<StockItem>, ServiceError> {
        let db = &*self.db_pool;
        let today = Utc::now().date_naive();

        let all = Product::find()
            .filter(product::Column::IsDeleted.eq(false))
            .order_by_asc(product::Column::Quantity)
            .all(db)
            .await?;

        Ok(all
            .into_iter()
            .map(|m| self.to_stock_item(m, today))
            .filter(|item| item.stock_status != StockStatus::Healthy)
            .collect())
    }

    /// Live products whose expiry falls inside the warning window.
    pub async fn expiring_products(&self) -> Result<Vec<StockItem>, ServiceError> {
        let db = &*self.db_pool;
        let today = Utc::now().date_naive();

        let all = Product::find()
            .filter(product::Column::IsDeleted.eq(false))
            .filter(Condition::all().add(product::Column::ExpiryDate.is_not_null()))
            .order_by_asc(product::Column::ExpiryDate)
            .all(db)
            .await?;

        Ok(all
            .into_iter()
            .map(|m| self.to_stock_item(m, today))
            .filter(|item| item.is_expiring_soon)
            .collect())
    }

    /// Sets a product's quantity-on-hand outside the dispensing flow and
    /// records the correction in the stock movement ledger, atomically.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn adjust_stock(
        &self,
        request: AdjustStockRequest,
    ) -> Result<StockAdjustment, ServiceError> {
        request.validate()?;

        let db = &*self.db_pool;
        let reason = request.reason.clone();

        let adjustment = db
            .transaction::<_, StockAdjustment, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = Product::find_by_id(request.product_id)
                        .filter(product::Column::IsDeleted.eq(false))
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Product {} not found",
                                request.product_id
                            ))
                        })?;

                    let previous_quantity = existing.quantity;
                    let delta = request.quantity - previous_quantity;

                    let mut active: ProductActiveModel = existing.into();
                    active.quantity = Set(request.quantity);
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(txn).await?;

                    let movement = stock_movement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        product_id: Set(request.product_id),
                        movement_type: Set(MovementType::Adjustment.to_string()),
                        quantity_change: Set(delta),
                        previous_quantity: Set(previous_quantity),
                        new_quantity: Set(request.quantity),
                        reason: Set(Some(request.reason.clone())),
                        reference_id: Set(None),
                        reference_type: Set(Some("manual_adjustment".to_string())),
                        created_by: Set(Some(request.adjusted_by)),
                        ..Default::default()
                    };
                    movement.insert(txn).await?;

                    Ok(StockAdjustment {
                        product_id: request.product_id,
                        previous_quantity,
                        new_quantity: request.quantity,
                        delta,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            product_id = %adjustment.product_id,
            previous_quantity = adjustment.previous_quantity,
            new_quantity = adjustment.new_quantity,
            "Stock adjusted"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::StockAdjusted {
                    product_id: adjustment.product_id,
                    previous_quantity: adjustment.previous_quantity,
                    new_quantity: adjustment.new_quantity,
                    reason,
                })
                .await
            {
                warn!(error = %e, "Failed to send stock adjusted event");
            }
        }

        Ok(adjustment)
    }
}
