//! # API Kernel
//!
//! The request pipeline: resolve the route, pick the provider or processor
//! the operation declares, normalize the outcome and translate failures into
//! statuses through the resource's exception table.
//!
//! ```text
//! ApiRequest ─► ResourceRegistry::resolve ─► GET  ─► GridListProvider | QueryProvider
//!                                           └► write ─► ActionProcessor | CommandProcessor
//!            ◄─ ApiResponse { status, body } ◄─ Normalizer::normalize / ExceptionTable
//! ```

use crate::bus::{CommandBus, QueryBus};
use crate::context::RequestContext;
use crate::error::ApiError;
use crate::grid::{GridListProvider, PageLimits, SearchCriteria};
use crate::normalizer::Normalizer;
use crate::processor::CommandProcessor;
use crate::provider::QueryProvider;
use crate::resource::{
    HttpMethod, InputFormat, Operation, OutputKind, ProcessorKind, ProviderKind, Resource,
    ResourceDescriptor, ResourceRegistry, UriVariables,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Body of an inbound request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    Json(Value),
    /// Decoded `multipart/form-data` fields.
    Form(Map<String, Value>),
    #[default]
    Empty,
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: RequestBody,
    pub context: RequestContext,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            body: RequestBody::Empty,
            context: RequestContext::default(),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: &str, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(RequestBody::Json(body))
    }

    pub fn put(path: &str, body: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_body(RequestBody::Json(body))
    }

    pub fn patch(path: &str, body: Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_body(RequestBody::Json(body))
    }

    pub fn delete(path: &str) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A named write handler for operations with no CQRS command.
#[async_trait]
pub trait ActionProcessor: Send + Sync {
    async fn process(
        &self,
        operation: &Operation,
        body: Map<String, Value>,
        uri_variables: &UriVariables,
        ctx: &RequestContext,
    ) -> Result<Option<Value>, ApiError>;
}

pub struct ApiKernel {
    registry: Arc<ResourceRegistry>,
    provider: QueryProvider,
    processor: CommandProcessor,
    grids: GridListProvider,
    actions: HashMap<String, Arc<dyn ActionProcessor>>,
    limits: PageLimits,
}

impl ApiKernel {
    pub fn new(
        registry: Arc<ResourceRegistry>,
        queries: Arc<dyn QueryBus>,
        commands: Arc<dyn CommandBus>,
    ) -> Self {
        let provider = QueryProvider::new(queries);
        Self {
            registry,
            processor: CommandProcessor::new(commands, provider.clone()),
            provider,
            grids: GridListProvider::new(),
            actions: HashMap::new(),
            limits: PageLimits::default(),
        }
    }

    pub fn with_grids(mut self, grids: GridListProvider) -> Self {
        self.grids = grids;
        self
    }

    pub fn with_page_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Registers a custom processor under the name operations refer to.
    pub fn with_action_processor(
        mut self,
        name: &str,
        processor: Arc<dyn ActionProcessor>,
    ) -> Self {
        self.actions.insert(name.to_string(), processor);
        self
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        let Some(route) = self.registry.resolve(request.method, &request.path) else {
            let err = ApiError::RouteNotFound {
                method: request.method.to_string(),
                path: request.path.clone(),
            };
            warn!(error = %err, "Unroutable request");
            return error_response(404, &err);
        };

        let resource = route.resource;
        let operation = route.operation;
        match self
            .run(resource, operation, &route.uri_variables, request.body, &request.context)
            .await
        {
            Ok(body) => {
                let status = match (&body, request.method) {
                    (None, _) => 204,
                    (Some(_), HttpMethod::Post) => 201,
                    (Some(_), _) => 200,
                };
                info!(operation = %operation.name, status, "Request served");
                ApiResponse { status, body }
            }
            Err(err) => {
                let status = resource.descriptor.exceptions.status_for(err.kind());
                if status >= 500 {
                    error!(operation = %operation.name, status, error = %err, "Request failed");
                } else {
                    warn!(operation = %operation.name, status, error = %err, "Request rejected");
                }
                error_response(status, &err)
            }
        }
    }

    async fn run(
        &self,
        resource: &Resource,
        operation: &Operation,
        uri_variables: &UriVariables,
        body: RequestBody,
        ctx: &RequestContext,
    ) -> Result<Option<Value>, ApiError> {
        let descriptor = &resource.descriptor;

        if operation.method.is_read() {
            if let ProviderKind::Grid(_) = operation.provider {
                let criteria = SearchCriteria::from_request(&ctx.filters, self.limits);
                let mut list = self.grids.provide(resource, operation, &criteria, ctx).await?;
                list.items = list
                    .items
                    .into_iter()
                    .map(|item| Normalizer::normalize(item, descriptor))
                    .collect();
                return Ok(Some(serde_json::to_value(list)?));
            }
            let result = self.provider.provide(resource, operation, uri_variables, ctx).await?;
            return Ok(Some(normalize_output(result, descriptor)));
        }

        let body = body_fields(body, operation.input)?;
        let result = match &operation.processor {
            ProcessorKind::Custom(name) => {
                let processor = self
                    .actions
                    .get(name)
                    .ok_or_else(|| ApiError::ProcessorNotRegistered(name.clone()))?;
                processor.process(operation, body, uri_variables, ctx).await?
            }
            ProcessorKind::Command => {
                self.processor
                    .process(resource, operation, body, uri_variables, ctx)
                    .await?
            }
        };

        if operation.output == OutputKind::NoContent {
            return Ok(None);
        }
        Ok(result.map(|value| normalize_output(value, descriptor)))
    }
}

fn normalize_output(value: Value, descriptor: &ResourceDescriptor) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| normalize_output(item, descriptor))
                .collect(),
        ),
        other => Normalizer::normalize(other, descriptor),
    }
}

fn body_fields(body: RequestBody, input: InputFormat) -> Result<Map<String, Value>, ApiError> {
    match (body, input) {
        (RequestBody::Empty, _) | (RequestBody::Json(Value::Null), _) => Ok(Map::new()),
        (RequestBody::Json(Value::Object(map)), InputFormat::Json) => Ok(map),
        (RequestBody::Json(_), InputFormat::Json) => Err(ApiError::Unsupported(
            "request body must be a JSON object".into(),
        )),
        (RequestBody::Form(fields), InputFormat::Multipart { .. }) => Ok(fields),
        (RequestBody::Form(_), InputFormat::Json) => Err(ApiError::Unsupported(
            "form data sent to a JSON operation".into(),
        )),
        (RequestBody::Json(_), InputFormat::Multipart { .. }) => Err(ApiError::Unsupported(
            "JSON sent to a multipart operation".into(),
        )),
    }
}

fn error_response(status: u16, err: &ApiError) -> ApiResponse {
    ApiResponse {
        status,
        body: Some(json!({
            "status": status,
            "type": err.kind(),
            "detail": err.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BusError, ErrorKind};
    use crate::mock::{MockCommandBus, MockQueryBus};
    use crate::resource::{FieldType, ResourceDescriptor};

    struct Recorder;

    #[async_trait]
    impl ActionProcessor for Recorder {
        async fn process(
            &self,
            _operation: &Operation,
            body: Map<String, Value>,
            _uri_variables: &UriVariables,
            _ctx: &RequestContext,
        ) -> Result<Option<Value>, ApiError> {
            if body.contains_key("fail") {
                return Err(ApiError::InvalidArgument("fail requested".into()));
            }
            Ok(None)
        }
    }

    fn registry() -> Arc<ResourceRegistry> {
        Arc::new(
            ResourceRegistry::new(vec![ResourceDescriptor::new("Order")
                .identifier("orderId")
                .field("orderId", FieldType::Int)
                .nullable_field("reference", FieldType::String)
                .exception(ErrorKind::NotFound, 404)
                .exception(ErrorKind::InvalidArgument, 400)
                .operation(
                    Operation::get("order_get", "/orders/{orderId}")
                        .requirement("orderId", r"\d+")
                        .query("GetOrderForViewing"),
                )
                .operation(
                    Operation::put("order_status", "/orders/{orderId}/status")
                        .custom_processor("order_action")
                        .no_content(),
                )
                .operation(
                    Operation::put("order_unknown", "/orders/{orderId}/other")
                        .custom_processor("missing"),
                )])
            .unwrap(),
        )
    }

    fn kernel(queries: &MockQueryBus) -> ApiKernel {
        ApiKernel::new(registry(), queries.shared(), MockCommandBus::new().shared())
            .with_action_processor("order_action", Arc::new(Recorder))
    }

    #[tokio::test]
    async fn test_get_normalizes_and_strips_nulls() {
        let mut queries = MockQueryBus::new();
        queries
            .expect_ask("GetOrderForViewing")
            .return_ok(Some(serde_json::json!({"orderId": 5, "reference": null})));

        let response = kernel(&queries).handle(ApiRequest::get("/orders/5")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Some(serde_json::json!({"orderId": 5})));
    }

    #[tokio::test]
    async fn test_domain_errors_use_exception_table() {
        let mut queries = MockQueryBus::new();
        queries
            .expect_ask("GetOrderForViewing")
            .return_err(BusError::not_found("Order 5 not found"));

        let response = kernel(&queries).handle(ApiRequest::get("/orders/5")).await;
        assert_eq!(response.status, 404);
        assert_eq!(response.body.unwrap()["detail"], "Order 5 not found");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = kernel(&MockQueryBus::new())
            .handle(ApiRequest::get("/orders/abc"))
            .await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_custom_processor_returns_no_content() {
        let k = kernel(&MockQueryBus::new());
        let response = k
            .handle(ApiRequest::put("/orders/5/status", serde_json::json!({"statusId": 2})))
            .await;
        assert_eq!(response, ApiResponse { status: 204, body: None });

        let response = k
            .handle(ApiRequest::put("/orders/5/status", serde_json::json!({"fail": true})))
            .await;
        assert_eq!(response.status, 400);
    }

    #[tokio::test]
    async fn test_unregistered_processor_is_server_error() {
        let response = kernel(&MockQueryBus::new())
            .handle(ApiRequest::put("/orders/5/other", serde_json::json!({})))
            .await;
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn test_form_body_is_refused_on_json_operations() {
        let response = kernel(&MockQueryBus::new())
            .handle(
                ApiRequest::new(HttpMethod::Put, "/orders/5/status")
                    .with_body(RequestBody::Form(Map::new())),
            )
            .await;
        assert_eq!(response.status, 500);
        assert_eq!(response.body.unwrap()["type"], "unsupported");
    }
}
