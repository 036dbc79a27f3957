use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{de_decimal_lenient, de_opt_decimal_lenient, de_opt_i32_lenient};
use crate::{
    entities::product,
    errors::ServiceError,
    services::drugs::{CreateDrugRequest, UpdateDrugRequest},
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDrugPayload {
    pub code: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    pub category: String,
    /// Accepts a JSON number or a numeric string
    #[serde(default, deserialize_with = "de_opt_i32_lenient")]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_i32_lenient")]
    pub reorder_level: Option<i32>,
    #[serde(deserialize_with = "de_decimal_lenient")]
    pub price: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub unit: Option<String>,
    pub prescription_required: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDrugPayload {
    pub id: Uuid,
    pub code: Option<String>,
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i32_lenient")]
    pub quantity: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_i32_lenient")]
    pub reorder_level: Option<i32>,
    #[serde(default, deserialize_with = "de_opt_decimal_lenient")]
    pub price: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub unit: Option<String>,
    pub prescription_required: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDrugPayload {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrugResponse {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub generic_name: Option<String>,
    pub brand_name: Option<String>,
    pub category: String,
    pub quantity: i32,
    pub reorder_level: Option<i32>,
    pub price: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub batch_number: Option<String>,
    pub unit: String,
    pub prescription_required: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<product::Model> for DrugResponse {
    fn from(model: product::Model) -> Self {
        Self {
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
            prescription_required: model.prescription_required,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn drugs_router() -> Router<AppState> {
    Router::new().route(
        "/drugs",
        get(list_drugs)
            .post(create_drug)
            .put(update_drug)
            .delete(delete_drug),
    )
}

/// List all non-deleted drugs, newest first
#[utoipa::path(
    get,
    path = "/drugs",
    responses(
        (status = 200, description = "Drug list returned"),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "drugs"
)]
pub async fn list_drugs(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let drugs: Vec<DrugResponse> = state
        .services
        .drugs
        .list_drugs()
        .await?
        .into_iter()
        .map(DrugResponse::from)
        .collect();

    Ok(Json(json!({ "success": true, "drugs": drugs })))
}

/// Create a drug; the code must be unique among live rows
#[utoipa::path(
    post,
    path = "/drugs",
    request_body = CreateDrugPayload,
    responses(
        (status = 201, description = "Drug created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 409, description = "Drug code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "drugs"
)]
pub async fn create_drug(
    State(state): State<AppState>,
    Json(payload): Json<CreateDrugPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = CreateDrugRequest {
        code: payload.code,
        name: payload.name,
        generic_name: payload.generic_name,
        brand_name: payload.brand_name,
        category: payload.category,
        quantity: payload.quantity.unwrap_or(0),
        reorder_level: payload.reorder_level,
        price: payload.price,
        expiry_date: payload.expiry_date,
        batch_number: payload.batch_number,
        unit: payload.unit,
        prescription_required: payload.prescription_required,
    };

    let drug = state.services.drugs.create_drug(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "drug": DrugResponse::from(drug) })),
    ))
}

/// Update a drug by id carried in the body
#[utoipa::path(
    put,
    path = "/drugs",
    request_body = UpdateDrugPayload,
    responses(
        (status = 200, description = "Drug updated"),
        (status = 404, description = "Drug not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Drug code already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "drugs"
)]
pub async fn update_drug(
    State(state): State<AppState>,
    Json(payload): Json<UpdateDrugPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = UpdateDrugRequest {
        id: payload.id,
        code: payload.code,
        name: payload.name,
        generic_name: payload.generic_name,
        brand_name: payload.brand_name,
        category: payload.category,
        quantity: payload.quantity,
        reorder_level: payload.reorder_level,
        price: payload.price,
        expiry_date: payload.expiry_date,
        batch_number: payload.batch_number,
        unit: payload.unit,
        prescription_required: payload.prescription_required,
    };

    let drug = state.services.drugs.update_drug(request).await?;

    Ok(Json(
        json!({ "success": true, "drug": DrugResponse::from(drug) }),
    ))
}

/// Soft-delete a drug by id carried in the body
#[utoipa::path(
    delete,
    path = "/drugs",
    request_body = DeleteDrugPayload,
    responses(
        (status = 200, description = "Drug soft-deleted"),
        (status = 404, description = "Drug not found", body = crate::errors::ErrorResponse)
    ),
    tag = "drugs"
)]
pub async fn delete_drug(
    State(state): State<AppState>,
    Json(payload): Json<DeleteDrugPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.drugs.delete_drug(payload.id).await?;

    Ok(Json(
        json!({ "success": true, "message": "Drug deleted" }),
    ))
}
