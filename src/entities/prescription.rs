use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Physician-authored order. Status and priority are stored as their
/// snake_case string forms; see crate::models for the enums.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "prescriptions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Prescription number must be between 1 and 50 characters"
    ))]
    pub prescription_no: String,

    pub patient_id: Uuid,
    pub physician_id: Uuid,

    /// pending | partially_dispensed | dispensed
    pub status: String,

    /// emergency | urgent | normal
    pub priority: String,

    pub total_cost: Decimal,
    pub notes: Option<String>,

    /// Set only once the prescription is fully dispensed
    pub dispensed_at: Option<DateTime<Utc>>,
    pub dispensed_by: Option<Uuid>,

    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patient::Entity",
        from = "Column::PatientId",
        to = "super::patient::Column::Id"
    )]
    Patient,
    #[sea_orm(
        belongs_to = "super::physician::Entity",
        from = "Column::PhysicianId",
        to = "super::physician::Column::Id"
    )]
    Physician,
    #[sea_orm(has_many = "super::prescription_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::drug_dispensal::Entity")]
    Dispensals,
}

impl Related<super::patient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<super::physician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Physician.def()
    }
}

impl Related<super::prescription_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::drug_dispensal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dispensals.def()
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
            if let ActiveValue::NotSet = active_model.is_deleted {
                active_model.is_deleted = Set(false);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        Ok(active_model)
    }
}
