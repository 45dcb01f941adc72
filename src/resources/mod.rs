//! Shop resources exposed over the API.
//!
//! Every resource is declared in its own module and collected into one
//! immutable [`ResourceRegistry`] at startup by [`registry`].

pub mod api_client;
pub mod api_client_list;
pub mod cart;
pub mod customization_field;
pub mod module;
pub mod order;
pub mod product;

use resource_framework::{RegistryError, ResourceRegistry};

/// Grid serving `GET /api-clients`.
pub const API_CLIENT_GRID: &str = "api_client";
/// Grid serving `GET /modules`.
pub const MODULE_GRID: &str = "module";
/// Name the order action processor is registered under.
pub const ORDER_ACTIONS: &str = "order_actions";

pub fn registry() -> Result<ResourceRegistry, RegistryError> {
    ResourceRegistry::new(vec![
        api_client::resource(),
        api_client_list::resource(),
        cart::resource(),
        order::resource(),
        product::resource(),
        product::image_resource(),
        customization_field::resource(),
        module::resource(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::resource::ProviderKind;
    use resource_framework::HttpMethod;
    use serde_json::json;

    #[test]
    fn test_registry_builds() {
        let registry = registry().unwrap();
        assert_eq!(registry.resources().len(), 8);
    }

    #[test]
    fn test_routes_resolve_to_expected_operations() {
        let registry = registry().unwrap();
        let cases = [
            (HttpMethod::Get, "/api-clients/1", "api_client_get"),
            (HttpMethod::Get, "/api-clients", "api_client_list"),
            (HttpMethod::Patch, "/cart/4/products", "cart_product_update"),
            (HttpMethod::Put, "/orders/2/status", "order_status_update"),
            (HttpMethod::Put, "/orders/2/tracking", "order_tracking_update"),
            (HttpMethod::Post, "/products/8/images", "product_image_add"),
            (
                HttpMethod::Get,
                "/products/8/customization-fields",
                "customization_field_list",
            ),
            (HttpMethod::Get, "/modules", "module_list"),
        ];
        for (method, path, expected) in cases {
            let route = registry
                .resolve(method, path)
                .unwrap_or_else(|| panic!("{method} {path} did not resolve"));
            assert_eq!(route.operation.name, expected);
        }
    }

    #[test]
    fn test_api_client_id_must_be_numeric() {
        let registry = registry().unwrap();
        assert!(registry.resolve(HttpMethod::Get, "/api-clients/abc").is_none());
    }

    #[test]
    fn test_customization_fields_unwrap_and_stamp_product() {
        let registry = registry().unwrap();
        let (_, operation) = registry.operation("customization_field_list").unwrap();
        let ProviderKind::UnwrapCollection(unwrap) = &operation.provider else {
            panic!("expected an unwrapping provider");
        };
        assert_eq!(unwrap.inner.to_string(), "customizationFields");
        let parent = unwrap.parent.as_ref().unwrap();
        assert_eq!(
            (parent.uri_variable.as_str(), parent.field.as_str()),
            ("productId", "productId")
        );
    }

    #[test]
    fn test_api_client_commands_use_reversed_result_renames() {
        let registry = registry().unwrap();
        let (_, operation) = registry.operation("api_client_update").unwrap();
        let command = operation
            .command_mapping
            .apply(&json!({"apiClientId": 2, "clientName": "Renamed", "enabled": false}));
        assert_eq!(
            command,
            json!({"id_api_client": 2, "client_name": "Renamed", "enabled": false})
        );
        let result = operation.result_mapping.apply(&command);
        assert_eq!(
            result,
            json!({"apiClientId": 2, "clientName": "Renamed", "enabled": false})
        );
    }
}
