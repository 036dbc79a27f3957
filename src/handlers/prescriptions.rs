use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{de_decimal_lenient, de_i32_lenient};
use crate::{
    errors::ServiceError,
    services::{
        dispensing::{DispenseItemRequest, DispenseRequest},
        prescriptions::{CreatePrescriptionItem, CreatePrescriptionRequest, PendingQuery},
    },
    AppState,
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PendingFilters {
    /// emergency | urgent | normal
    pub priority: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionPayload {
    pub patient_id: Uuid,
    pub physician_id: Uuid,
    pub priority: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<CreatePrescriptionItemPayload>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionItemPayload {
    pub product_id: Uuid,
    #[serde(deserialize_with = "de_i32_lenient")]
    pub quantity: i32,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispensePayload {
    pub items: Vec<DispenseItemPayload>,
    #[serde(deserialize_with = "de_decimal_lenient")]
    pub total_amount: Decimal,
    #[serde(default, deserialize_with = "super::common::de_opt_decimal_lenient")]
    pub amount_paid: Option<Decimal>,
    pub payment_method: String,
    pub notes: Option<String>,
    pub dispensed_by: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispenseItemPayload {
    pub item_id: Uuid,
    pub product_id: Uuid,
    #[serde(deserialize_with = "de_i32_lenient")]
    pub quantity: i32,
}

pub fn prescriptions_router() -> Router<AppState> {
    Router::new()
        .route("/prescriptions", post(create_prescription))
        .route("/prescriptions/pending", get(pending_prescriptions))
        .route("/prescriptions/:id", get(get_prescription))
        .route("/prescriptions/:id/dispense", post(dispense_prescription))
}

/// Queue of prescriptions that still have items to dispense
#[utoipa::path(
    get,
    path = "/pharmacist/prescriptions/pending",
    params(PendingFilters),
    responses(
        (status = 200, description = "Pending queue returned"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "prescriptions"
)]
pub async fn pending_prescriptions(
    State(state): State<AppState>,
    Query(filters): Query<PendingFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = state
        .services
        .prescriptions
        .pending_queue(PendingQuery {
            priority: filters.priority,
            search: filters.search,
            page: filters.page.unwrap_or(1),
            limit: filters.limit.unwrap_or(20),
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "prescriptions": page.prescriptions,
        "priorityCounts": page.priority_counts,
        "total": page.total,
        "page": page.page,
        "limit": page.limit,
    })))
}

/// Full prescription detail with patient, physician, and per-item stock data
#[utoipa::path(
    get,
    path = "/pharmacist/prescriptions/{id}",
    params(("id" = Uuid, Path, description = "Prescription id")),
    responses(
        (status = 200, description = "Prescription detail returned"),
        (status = 404, description = "Prescription not found", body = crate::errors::ErrorResponse)
    ),
    tag = "prescriptions"
)]
pub async fn get_prescription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let prescription = state.services.prescriptions.get_prescription(id).await?;

    Ok(Json(json!({ "success": true, "prescription": prescription })))
}

/// Create a prescription, pricing each line from the current catalog
#[utoipa::path(
    post,
    path = "/pharmacist/prescriptions",
    request_body = CreatePrescriptionPayload,
    responses(
        (status = 201, description = "Prescription created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Patient or physician not found", body = crate::errors::ErrorResponse)
    ),
    tag = "prescriptions"
)]
pub async fn create_prescription(
    State(state): State<AppState>,
    Json(payload): Json<CreatePrescriptionPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = CreatePrescriptionRequest {
        patient_id: payload.patient_id,
        physician_id: payload.physician_id,
        priority: payload.priority,
        notes: payload.notes,
        items: payload
            .items
            .into_iter()
            .map(|item| CreatePrescriptionItem {
                product_id: item.product_id,
                quantity: item.quantity,
                dosage: item.dosage,
                frequency: item.frequency,
                duration: item.duration,
                instructions: item.instructions,
            })
            .collect(),
    };

    let prescription = state
        .services
        .prescriptions
        .create_prescription(request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "prescription": prescription })),
    ))
}

/// Atomically dispense prescription items: verify stock, decrement
/// inventory, write the receipt and payment ledger rows
#[utoipa::path(
    post,
    path = "/pharmacist/prescriptions/{id}/dispense",
    params(("id" = Uuid, Path, description = "Prescription id")),
    request_body = DispensePayload,
    responses(
        (status = 200, description = "Prescription dispensed"),
        (status = 400, description = "Validation failure, e.g. insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Prescription not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Prescription already dispensed", body = crate::errors::ErrorResponse)
    ),
    tag = "prescriptions"
)]
pub async fn dispense_prescription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DispensePayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = DispenseRequest {
        items: payload
            .items
            .into_iter()
            .map(|item| DispenseItemRequest {
                item_id: item.item_id,
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect(),
        total_amount: payload.total_amount,
        amount_paid: payload.amount_paid.unwrap_or(Decimal::ZERO),
        payment_method: payload.payment_method,
        notes: payload.notes,
        dispensed_by: payload.dispensed_by,
    };

    let receipt = state.services.dispensing.dispense(id, request).await?;

    Ok(Json(json!({ "success": true, "dispensal": receipt })))
}
