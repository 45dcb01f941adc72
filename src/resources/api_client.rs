//! API clients: credentials third-party integrations use to call the shop.

use resource_framework::{ErrorKind, FieldType, Operation, ResourceDescriptor};

/// Domain field → API field.
pub const API_CLIENT_RENAMES: [(&str, &str); 4] = [
    ("id_api_client", "apiClientId"),
    ("client_id", "clientId"),
    ("client_name", "clientName"),
    ("external_issuer", "externalIssuer"),
];

fn command_renames() -> [(&'static str, &'static str); 4] {
    API_CLIENT_RENAMES.map(|(domain, api)| (api, domain))
}

pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("ApiClient")
        .identifier("apiClientId")
        .field("apiClientId", FieldType::Int)
        .field("clientId", FieldType::String)
        .field("clientName", FieldType::String)
        .field("enabled", FieldType::Bool)
        .nullable_field("description", FieldType::String)
        .nullable_field("externalIssuer", FieldType::String)
        .field("scopes", FieldType::Array)
        .field("lifetime", FieldType::Int)
        .skip_null_values(false)
        .exception(ErrorKind::NotFound, 404)
        .exception(ErrorKind::InvalidArgument, 400)
        .exception(ErrorKind::Validation, 422)
        .exception(ErrorKind::Constraint, 422)
        .operation(
            Operation::get("api_client_get", "/api-clients/{apiClientId}")
                .requirement("apiClientId", r"\d+")
                .scopes(["api_client_read"])
                .query("GetApiClientForEditing")
                .result_mapping(API_CLIENT_RENAMES),
        )
        .operation(
            Operation::post("api_client_create", "/api-clients")
                .scopes(["api_client_write"])
                .command("AddApiClientCommand")
                .command_mapping(command_renames())
                .query("GetApiClientForEditing")
                .result_mapping(API_CLIENT_RENAMES),
        )
        .operation(
            Operation::patch("api_client_update", "/api-clients/{apiClientId}")
                .requirement("apiClientId", r"\d+")
                .scopes(["api_client_write"])
                .command("EditApiClientCommand")
                .command_mapping(command_renames())
                .query("GetApiClientForEditing")
                .result_mapping(API_CLIENT_RENAMES),
        )
        .operation(
            Operation::delete("api_client_delete", "/api-clients/{apiClientId}")
                .requirement("apiClientId", r"\d+")
                .scopes(["api_client_write"])
                .command("DeleteApiClientCommand")
                .command_mapping(command_renames())
                .no_content(),
        )
}
