//! Command processor: the write path for operations bound to a CQRS command.

use crate::bus::{Command, CommandBus};
use crate::context::{merge_parameters, RequestContext};
use crate::error::ApiError;
use crate::normalizer::Normalizer;
use crate::provider::QueryProvider;
use crate::resource::{Operation, OutputKind, Resource, UriVariables};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct CommandProcessor {
    bus: Arc<dyn CommandBus>,
    provider: QueryProvider,
}

impl CommandProcessor {
    pub fn new(bus: Arc<dyn CommandBus>, provider: QueryProvider) -> Self {
        Self { bus, provider }
    }

    /// Validates `body`, dispatches the bound command and builds the response.
    ///
    /// When the operation also binds a query, the resource is re-read with the
    /// command's returned id as identifier; otherwise the submitted resource is
    /// echoed back. `NoContent` operations yield `None`.
    pub async fn process(
        &self,
        resource: &Resource,
        operation: &Operation,
        body: Map<String, Value>,
        uri_variables: &UriVariables,
        ctx: &RequestContext,
    ) -> Result<Option<Value>, ApiError> {
        let command_name = operation
            .command
            .as_deref()
            .ok_or_else(|| ApiError::CommandNotBound {
                operation: operation.name.clone(),
            })?;

        let descriptor = &resource.descriptor;
        let body = Normalizer::validate_input(body, descriptor, operation.input, &ctx.languages)?;
        let parameters =
            merge_parameters([&ctx.parameters(), &ctx.filters, &body, uri_variables]);
        let payload = operation.command_mapping.apply(&Value::Object(parameters));
        debug!(
            operation = %operation.name,
            command = command_name,
            ?payload,
            "Dispatching command"
        );

        let result = self
            .bus
            .dispatch(Command::new(command_name, payload))
            .await?;
        info!(operation = %operation.name, command = command_name, "Command dispatched");

        if operation.output == OutputKind::NoContent {
            return Ok(None);
        }

        if operation.query.is_some() {
            let mut variables = uri_variables.clone();
            let id = result.as_ref().and_then(returned_id);
            if let (Some(identifier), Some(id)) = (&descriptor.identifier, id) {
                variables.insert(identifier.clone(), id);
            }
            let enriched = self
                .provider
                .provide(resource, operation, &variables, ctx)
                .await?;
            return Ok(Some(enriched));
        }

        let mut echoed = body;
        for (name, value) in uri_variables {
            echoed.insert(name.clone(), value.clone());
        }
        let built =
            Normalizer::denormalize(Value::Object(echoed), descriptor, &ctx.languages, None)?;
        Ok(Some(built))
    }
}

/// The id a command handler returned: a bare scalar or `{"id": ..}` / `{"value": ..}`.
fn returned_id(result: &Value) -> Option<Value> {
    match result {
        Value::Number(_) | Value::String(_) => Some(result.clone()),
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("value"))
            .filter(|v| v.is_number() || v.is_string())
            .cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCommandBus, MockQueryBus};
    use crate::resource::{FieldType, ResourceDescriptor, ResourceRegistry};
    use serde_json::json;

    fn registry() -> ResourceRegistry {
        ResourceRegistry::new(vec![
            ResourceDescriptor::new("ApiClient")
                .identifier("apiClientId")
                .field("apiClientId", FieldType::Int)
                .field("clientName", FieldType::String)
                .operation(
                    Operation::post("api_client_create", "/api-clients")
                        .command("AddApiClientCommand")
                        .query("GetApiClientForEditing")
                        .command_mapping([("clientName", "client_name")])
                        .result_mapping([
                            ("id_api_client", "apiClientId"),
                            ("client_name", "clientName"),
                        ]),
                )
                .operation(
                    Operation::delete("api_client_delete", "/api-clients/{apiClientId}")
                        .command("DeleteApiClientCommand")
                        .no_content(),
                ),
            ResourceDescriptor::new("CartProduct")
                .field("cartId", FieldType::Int)
                .field("productId", FieldType::Int)
                .field("quantity", FieldType::Int)
                .operation(
                    Operation::patch("cart_product_update", "/cart/{cartId}/products")
                        .command("UpdateProductQuantityInCartCommand"),
                )
                .operation(Operation::put("cart_unbound", "/cart/{cartId}")),
        ])
        .unwrap()
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn without_queries(commands: &MockCommandBus) -> CommandProcessor {
        CommandProcessor::new(
            commands.shared(),
            QueryProvider::new(MockQueryBus::new().shared()),
        )
    }

    #[tokio::test]
    async fn test_create_rereads_with_returned_id() {
        let registry = registry();
        let (resource, operation) = registry.operation("api_client_create").unwrap();
        let mut commands = MockCommandBus::new();
        commands
            .expect_dispatch("AddApiClientCommand")
            .with_payload(json!({"client_name": "erp"}))
            .return_ok(Some(json!({"id": 12})));
        let mut queries = MockQueryBus::new();
        queries
            .expect_ask("GetApiClientForEditing")
            .with_payload(json!({"apiClientId": 12}))
            .return_ok(Some(json!({"id_api_client": 12, "client_name": "erp"})));

        let processor =
            CommandProcessor::new(commands.shared(), QueryProvider::new(queries.shared()));
        let result = processor
            .process(
                resource,
                operation,
                map(json!({"clientName": "erp"})),
                &UriVariables::new(),
                &RequestContext::new(),
            )
            .await
            .unwrap();

        assert_eq!(result, Some(json!({"apiClientId": 12, "clientName": "erp"})));
        commands.verify();
        queries.verify();
    }

    #[tokio::test]
    async fn test_no_content_returns_none() {
        let registry = registry();
        let (resource, operation) = registry.operation("api_client_delete").unwrap();
        let mut commands = MockCommandBus::new();
        commands
            .expect_dispatch("DeleteApiClientCommand")
            .with_payload(json!({"apiClientId": 4}))
            .return_ok(None);

        let processor = without_queries(&commands);
        let result = processor
            .process(
                resource,
                operation,
                Map::new(),
                &map(json!({"apiClientId": 4})),
                &RequestContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_uri_variables_merge_into_command_unchanged() {
        let registry = registry();
        let (resource, operation) = registry.operation("cart_product_update").unwrap();
        let mut commands = MockCommandBus::new();
        commands
            .expect_dispatch("UpdateProductQuantityInCartCommand")
            .with_payload(json!({"cartId": 3, "productId": 20, "quantity": 2}))
            .return_ok(None);

        let processor = without_queries(&commands);
        let result = processor
            .process(
                resource,
                operation,
                map(json!({"productId": 20, "quantity": 2})),
                &map(json!({"cartId": 3})),
                &RequestContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(result, Some(json!({"cartId": 3, "productId": 20, "quantity": 2})));
    }

    #[tokio::test]
    async fn test_uri_variables_win_over_body() {
        let registry = registry();
        let (resource, operation) = registry.operation("cart_product_update").unwrap();
        let mut commands = MockCommandBus::new();
        commands
            .expect_dispatch("UpdateProductQuantityInCartCommand")
            .with_payload(json!({"cartId": 3, "productId": 20, "quantity": 1}))
            .return_ok(None);

        let processor = without_queries(&commands);
        processor
            .process(
                resource,
                operation,
                map(json!({"cartId": 99, "productId": 20, "quantity": 1})),
                &map(json!({"cartId": 3})),
                &RequestContext::new(),
            )
            .await
            .unwrap();
        commands.verify();
    }

    #[tokio::test]
    async fn test_invalid_body_is_rejected_before_dispatch() {
        let registry = registry();
        let (resource, operation) = registry.operation("cart_product_update").unwrap();
        let commands = MockCommandBus::new();

        let processor = without_queries(&commands);
        let err = processor
            .process(
                resource,
                operation,
                map(json!({"quantity": "two"})),
                &map(json!({"cartId": 3})),
                &RequestContext::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert!(commands.received().is_empty());
    }

    #[tokio::test]
    async fn test_missing_command_fails_loudly() {
        let registry = registry();
        let (resource, operation) = registry.operation("cart_unbound").unwrap();
        let processor = CommandProcessor::new(
            MockCommandBus::new().shared(),
            QueryProvider::new(MockQueryBus::new().shared()),
        );
        let err = processor
            .process(resource, operation, Map::new(), &UriVariables::new(), &RequestContext::new())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::CommandNotBound { operation: "cart_unbound".into() });
    }

    #[test]
    fn test_returned_id_shapes() {
        assert_eq!(returned_id(&json!(5)), Some(json!(5)));
        assert_eq!(returned_id(&json!({"value": 6})), Some(json!(6)));
        assert_eq!(returned_id(&json!({"other": 1})), None);
    }
}
