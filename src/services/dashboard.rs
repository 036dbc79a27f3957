use crate::{
    db::DbPool,
    entities::{
        balance_transaction::{self, Entity as BalanceTransaction},
        drug_dispensal::{self, Entity as DrugDispensal},
        prescription::{self, Entity as Prescription},
    },
    errors::ServiceError,
    models::{parse_priority, Priority},
    services::inventory::{InventoryService, StockItem},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub dispensal_count: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingStats {
    pub total: u64,
    pub emergency: u64,
    pub urgent: u64,
    pub normal: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopPriorityEntry {
    pub id: Uuid,
    pub prescription_no: String,
    pub priority: Priority,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentDispensal {
    pub dispensal_no: String,
    pub prescription_id: Uuid,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAlerts {
    pub low_stock: Vec<StockItem>,
    pub expiring_soon: Vec<StockItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub today: TodayStats,
    pub pending: PendingStats,
    pub top_priority: Vec<TopPriorityEntry>,
    pub inventory_alerts: InventoryAlerts,
    pub recent_dispensals: Vec<RecentDispensal>,
}

/// How many rows the dashboard shows per list section.
const SECTION_LIMIT: u64 = 5;

/// Read-only aggregation over current state. Numbers here are advisory
/// snapshots; nothing requires cross-query consistency.
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    inventory: InventoryService,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, inventory: InventoryService) -> Self {
        Self { db_pool, inventory }
    }

    #[instrument(skip(self))]
    pub async fn overview(&self) -> Result<DashboardOverview, ServiceError> {
        let db = &*self.db_pool;
        let day_start = Utc::now()
            .date_naive()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc();

        let dispensal_count = DrugDispensal::find()
            .filter(drug_dispensal::Column::CreatedAt.gte(day_start))
            .count(db)
            .await?;

        let revenue = BalanceTransaction::find()
            .filter(balance_transaction::Column::CreatedAt.gte(day_start))
            .all(db)
            .await?
            .into_iter()
            .map(|t| t.amount)
            .sum();

        let open_statuses = [
            crate::models::PrescriptionStatus::Pending.to_string(),
            crate::models::PrescriptionStatus::PartiallyDispensed.to_string(),
        ];

        let mut pending = PendingStats {
            total: 0,
            emergency: 0,
            urgent: 0,
            normal: 0,
        };
        pending.total = Prescription::find()
            .filter(prescription::Column::IsDeleted.eq(false))
            .filter(prescription::Column::Status.is_in(open_statuses.clone()))
            .count(db)
            .await?;
        for priority in [Priority::Emergency, Priority::Urgent, Priority::Normal] {
            let count = Prescription::find()
                .filter(prescription::Column::IsDeleted.eq(false))
                .filter(prescription::Column::Status.is_in(open_statuses.clone()))
                .filter(prescription::Column::Priority.eq(priority.as_ref()))
                .count(db)
                .await?;
            match priority {
                Priority::Emergency => pending.emergency = count,
                Priority::Urgent => pending.urgent = count,
                Priority::Normal => pending.normal = count,
            }
        }

        // Emergencies first; within a priority the oldest waits longest.
        let mut top_priority = Vec::new();
        for priority in [Priority::Emergency, Priority::Urgent, Priority::Normal] {
            if top_priority.len() as u64 >= SECTION_LIMIT {
                break;
            }
            let remaining = SECTION_LIMIT - top_priority.len() as u64;
            let batch = Prescription::find()
                .filter(prescription::Column::IsDeleted.eq(false))
                .filter(prescription::Column::Status.is_in(open_statuses.clone()))
                .filter(prescription::Column::Priority.eq(priority.as_ref()))
                .order_by_asc(prescription::Column::CreatedAt)
                .limit(remaining)
                .all(db)
                .await?;
            for header in batch {
                top_priority.push(TopPriorityEntry {
                    id: header.id,
                    prescription_no: header.prescription_no,
                    priority: parse_priority(&header.priority)?,
                    total_cost: header.total_cost,
                    created_at: header.created_at,
                });
            }
        }

        let low_stock = self.inventory.low_stock_products().await?;
        let expiring_soon = self.inventory.expiring_products().await?;

        let recent_dispensals = DrugDispensal::find()
            .order_by_desc(drug_dispensal::Column::CreatedAt)
            .limit(SECTION_LIMIT)
            .all(db)
            .await?
            .into_iter()
            .map(|d| RecentDispensal {
                dispensal_no: d.dispensal_no,
                prescription_id: d.prescription_id,
                total_amount: d.total_amount,
                created_at: d.created_at,
            })
            .collect();

        Ok(DashboardOverview {
            today: TodayStats {
                dispensal_count,
                revenue,
            },
            pending,
            top_priority,
            inventory_alerts: InventoryAlerts {
                low_stock,
                expiring_soon,
            },
            recent_dispensals,
        })
    }
}
