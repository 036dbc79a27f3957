use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Drug product entity: one row per catalog entry with quantity-on-hand.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Facility-unique drug code among non-deleted rows
    #[validate(length(
        min = 1,
        max = 64,
        message = "Drug code must be between 1 and 64 characters"
    ))]
    pub code: String,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Drug name must be between 1 and 255 characters"
    ))]
    pub name: String,

    pub generic_name: Option<String>,
    pub brand_name: Option<String>,

    #[validate(length(min = 1, max = 128, message = "Category is required"))]
    pub category: String,

    /// Quantity on hand. Never driven negative by a dispensing operation.
    pub quantity: i32,

    /// Reorder threshold; classification falls back to the configured
    /// default when absent.
    pub reorder_level: Option<i32>,

    pub price: Decimal,

    pub expiry_date: Option<NaiveDate>,

    pub batch_number: Option<String>,

    /// Dispensing unit, e.g. "Pieces", "Bottles"
    pub unit: String,

    pub prescription_required: bool,

    /// Soft-delete flag; rows are never hard-deleted
    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::prescription_item::Entity")]
    PrescriptionItems,
}

impl Related<super::prescription_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrescriptionItems.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.prescription_required {
                active_model.prescription_required = Set(false);
            }
            if let ActiveValue::NotSet = active_model.is_deleted {
                active_model.is_deleted = Set(false);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        let model: Model = active_model.clone().try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
