//! # Query Provider
//!
//! Serves read operations: parameters from the request context, the filters and
//! the URI variables are merged, renamed through the operation's query table and
//! dispatched as a CQRS query. The result is renamed back through the result
//! table and built into the resource shape by the [`Normalizer`].
//!
//! Operations declared with [`ProviderKind::UnwrapCollection`] additionally
//! replace an aggregate result by its inner collection and stamp the parent id
//! from the URI onto every element.

use crate::bus::{Query, QueryBus};
use crate::context::{merge_parameters, RequestContext};
use crate::error::ApiError;
use crate::normalizer::Normalizer;
use crate::resource::{
    CollectionUnwrap, Operation, ProviderKind, Resource, ResourceDescriptor, UriVariables,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct QueryProvider {
    bus: Arc<dyn QueryBus>,
}

impl QueryProvider {
    pub fn new(bus: Arc<dyn QueryBus>) -> Self {
        Self { bus }
    }

    /// Runs the read pipeline for `operation` and returns the built resource,
    /// or an array of them for list results.
    pub async fn provide(
        &self,
        resource: &Resource,
        operation: &Operation,
        uri_variables: &UriVariables,
        ctx: &RequestContext,
    ) -> Result<Value, ApiError> {
        let query_name = operation
            .query
            .as_deref()
            .ok_or_else(|| ApiError::QueryNotBound {
                operation: operation.name.clone(),
            })?;

        let parameters = merge_parameters([&ctx.parameters(), &ctx.filters, uri_variables]);
        let payload = operation.query_mapping.apply(&Value::Object(parameters));
        debug!(operation = %operation.name, query = query_name, ?payload, "Dispatching query");

        let descriptor = &resource.descriptor;
        let Some(mut result) = self.bus.ask(Query::new(query_name, payload)).await? else {
            info!(operation = %operation.name, "Query returned nothing, using blank resource");
            return Ok(Normalizer::blank(descriptor));
        };

        let unwrap = match &operation.provider {
            ProviderKind::UnwrapCollection(unwrap) => Some(unwrap),
            _ => None,
        };
        if let Some(inner) = unwrap.and_then(|u| u.inner.get(&result)) {
            result = inner;
        }

        let mapped = operation.result_mapping.apply_each(&result);
        let injected = operation.uri_variables_in_result.then_some(uri_variables);
        let mut built = build(mapped, descriptor, ctx, injected)?;

        if let Some(unwrap) = unwrap {
            stamp_parent(&mut built, unwrap, uri_variables);
        }

        info!(operation = %operation.name, query = query_name, "Query served");
        Ok(built)
    }
}

fn build(
    data: Value,
    descriptor: &ResourceDescriptor,
    ctx: &RequestContext,
    uri_variables: Option<&UriVariables>,
) -> Result<Value, ApiError> {
    match data {
        Value::Array(items) => items
            .into_iter()
            .map(|item| build(item, descriptor, ctx, uri_variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Normalizer::denormalize(other, descriptor, &ctx.languages, uri_variables),
    }
}

fn stamp_parent(result: &mut Value, unwrap: &CollectionUnwrap, uri_variables: &UriVariables) {
    let Some(stamp) = &unwrap.parent else {
        return;
    };
    let Some(parent_id) = uri_variables.get(&stamp.uri_variable) else {
        return;
    };
    stamp_each(result, &stamp.field, parent_id);
}

fn stamp_each(value: &mut Value, field: &str, parent_id: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                stamp_each(item, field, parent_id);
            }
        }
        Value::Object(map) => {
            map.insert(field.to_string(), parent_id.clone());
        }
        _ => {}
    }
}
