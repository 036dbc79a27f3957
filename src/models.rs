use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Lifecycle of a prescription. Transitions only move forward:
/// pending -> partially_dispensed -> dispensed, or pending -> dispensed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Pending,
    PartiallyDispensed,
    Dispensed,
}

impl PrescriptionStatus {
    /// A prescription in one of these states still has items to hand out.
    pub fn is_dispensable(&self) -> bool {
        matches!(self, Self::Pending | Self::PartiallyDispensed)
    }
}

/// Queue priority. Emergency sorts before urgent, urgent before normal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Emergency,
    Urgent,
    Normal,
}

impl Priority {
    /// Sort rank for queue presentation, lower means first.
    pub fn rank(&self) -> i32 {
        match self {
            Self::Emergency => 0,
            Self::Urgent => 1,
            Self::Normal => 2,
        }
    }
}

/// Computed stock classification for a drug product.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Healthy,
}

/// Kind of inventory mutation recorded in the stock movement ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Dispense,
    Adjustment,
}

/// Direction of a balance ledger entry. Only debits are written today;
/// the column keeps the type explicit for future credit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BalanceEntryType {
    Debit,
    Credit,
}

pub fn parse_prescription_status(raw: &str) -> Result<PrescriptionStatus, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::InvalidStatus(format!("Unknown prescription status: {raw}")))
}

pub fn parse_priority(raw: &str) -> Result<Priority, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::InvalidInput(format!("Unknown priority: {raw}")))
}
