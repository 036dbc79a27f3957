use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::de_i32_lenient;
use crate::{
    errors::ServiceError,
    models::StockStatus,
    services::inventory::{AdjustStockRequest, StockQuery},
    AppState,
};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct StockFilters {
    pub category: Option<String>,
    /// out_of_stock | low_stock | healthy
    pub status: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    pub product_id: Uuid,
    /// New absolute quantity; accepts a JSON number or a numeric string
    #[serde(deserialize_with = "de_i32_lenient")]
    pub quantity: i32,
    pub reason: String,
    pub adjusted_by: Uuid,
}

pub fn inventory_router() -> Router<AppState> {
    Router::new().route("/inventory/stock", get(get_stock).patch(adjust_stock))
}

/// Paginated stock view with computed classification and summary
#[utoipa::path(
    get,
    path = "/pharmacist/inventory/stock",
    params(StockFilters),
    responses(
        (status = 200, description = "Stock list returned"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_stock(
    State(state): State<AppState>,
    Query(filters): Query<StockFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let status = filters
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<StockStatus>()
                .map_err(|_| ServiceError::InvalidInput(format!("Unknown stock status: {raw}")))
        })
        .transpose()?;

    let page = state
        .services
        .inventory
        .list_stock(StockQuery {
            category: filters.category,
            status,
            search: filters.search,
            page: filters.page.unwrap_or(1),
            limit: filters.limit.unwrap_or(20),
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "items": page.items,
        "summary": page.summary,
        "categories": page.categories,
        "total": page.total,
        "page": page.page,
        "limit": page.limit,
    })))
}

/// Set a product's quantity-on-hand, recording the correction in the
/// stock movement ledger
#[utoipa::path(
    patch,
    path = "/pharmacist/inventory/stock",
    request_body = AdjustStockPayload,
    responses(
        (status = 200, description = "Stock adjusted"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, ServiceError> {
    let adjustment = state
        .services
        .inventory
        .adjust_stock(AdjustStockRequest {
            product_id: payload.product_id,
            quantity: payload.quantity,
            reason: payload.reason,
            adjusted_by: payload.adjusted_by,
        })
        .await?;

    Ok(Json(json!({ "success": true, "adjustment": adjustment })))
}
