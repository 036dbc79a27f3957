use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pharmacy API",
        version = "0.1.0",
        description = r#"
# Clinic/Pharmacy Management API

Backend for single-facility pharmacy operations: drug catalog and
inventory, prescription queueing, dispensing, and the payment ledger.

## Error Handling

Every error uses one envelope with an appropriate HTTP status code:

```json
{
  "success": false,
  "error": "Conflict",
  "message": "A drug with code AMX-500 already exists",
  "timestamp": "2025-08-05T10:30:00.000Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20)
query parameters alongside their filters.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "drugs", description = "Drug catalog endpoints"),
        (name = "inventory", description = "Stock view and adjustment endpoints"),
        (name = "prescriptions", description = "Prescription queue and dispensing endpoints"),
        (name = "dashboard", description = "Aggregated statistics endpoints"),
        (name = "users", description = "Operator account endpoints")
    ),
    paths(
        // Drug catalog
        crate::handlers::drugs::list_drugs,
        crate::handlers::drugs::create_drug,
        crate::handlers::drugs::update_drug,
        crate::handlers::drugs::delete_drug,

        // Inventory
        crate::handlers::inventory::get_stock,
        crate::handlers::inventory::adjust_stock,

        // Prescriptions
        crate::handlers::prescriptions::pending_prescriptions,
        crate::handlers::prescriptions::get_prescription,
        crate::handlers::prescriptions::create_prescription,
        crate::handlers::prescriptions::dispense_prescription,

        // Dashboard
        crate::handlers::dashboard::get_dashboard,

        // Users
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
    ),
    components(
        schemas(
            // Drug types
            crate::handlers::drugs::DrugResponse,
            crate::handlers::drugs::CreateDrugPayload,
            crate::handlers::drugs::UpdateDrugPayload,
            crate::handlers::drugs::DeleteDrugPayload,

            // Inventory types
            crate::handlers::inventory::AdjustStockPayload,
            crate::services::inventory::StockItem,
            crate::services::inventory::StockSummary,

            // Prescription types
            crate::handlers::prescriptions::CreatePrescriptionPayload,
            crate::handlers::prescriptions::CreatePrescriptionItemPayload,
            crate::handlers::prescriptions::DispensePayload,
            crate::handlers::prescriptions::DispenseItemPayload,
            crate::services::prescriptions::PrescriptionDetail,
            crate::services::prescriptions::PrescriptionItemDetail,
            crate::services::prescriptions::PartySummary,
            crate::services::prescriptions::QueueEntry,
            crate::services::prescriptions::QueueItemFlag,
            crate::services::prescriptions::PriorityCounts,
            crate::services::dispensing::DispensalReceipt,

            // Dashboard types
            crate::services::dashboard::TodayStats,
            crate::services::dashboard::PendingStats,
            crate::services::dashboard::TopPriorityEntry,
            crate::services::dashboard::RecentDispensal,

            // User types
            crate::handlers::users::CreateUserPayload,
            crate::services::users::UserResponse,

            // Domain enums
            crate::models::PrescriptionStatus,
            crate::models::Priority,
            crate::models::StockStatus,

            // Error envelope
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_core_paths() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("Pharmacy API"));
        assert!(json.contains("/drugs"));
        assert!(json.contains("/pharmacist/prescriptions/{id}/dispense"));
    }
}
