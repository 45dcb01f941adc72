use super::api_client::API_CLIENT_RENAMES;
use super::API_CLIENT_GRID;
use resource_framework::{FieldType, Operation, ResourceDescriptor};

/// Paginated listing of API clients, served from the legacy grid.
///
/// Rows keep `description: null` in the output when it is unset.
pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("ApiClientList")
        .identifier("apiClientId")
        .field("apiClientId", FieldType::Int)
        .field("clientId", FieldType::String)
        .field("clientName", FieldType::String)
        .field("enabled", FieldType::Bool)
        .nullable_field("description", FieldType::String)
        .nullable_field("externalIssuer", FieldType::String)
        .field("lifetime", FieldType::Int)
        .skip_null_values(false)
        .operation(
            Operation::get("api_client_list", "/api-clients")
                .scopes(["api_client_read"])
                .grid(API_CLIENT_GRID)
                .result_mapping(API_CLIENT_RENAMES),
        )
}
