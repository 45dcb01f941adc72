//! # Resource Registry
//!
//! Resources and their operations are declared programmatically once at startup
//! and never mutated afterwards. A [`ResourceDescriptor`] names its fields, its
//! identifier, the status codes its errors map to and the [`Operation`]s it
//! exposes. Each operation binds one HTTP verb and URI template to at most one
//! CQRS query and one CQRS command, together with the rename tables used to
//! translate between the two shapes.
//!
//! ```rust
//! use resource_framework::resource::{FieldType, Operation, ResourceDescriptor, ResourceRegistry};
//! use resource_framework::HttpMethod;
//!
//! let registry = ResourceRegistry::new(vec![
//!     ResourceDescriptor::new("ApiClient")
//!         .identifier("apiClientId")
//!         .field("apiClientId", FieldType::Int)
//!         .field("clientName", FieldType::String)
//!         .operation(
//!             Operation::get("api_client_get", "/api-clients/{apiClientId}")
//!                 .requirement("apiClientId", r"\d+")
//!                 .query("GetApiClientForEditing")
//!                 .result_mapping([("id_api_client", "apiClientId")]),
//!         ),
//! ])
//! .unwrap();
//!
//! let route = registry.resolve(HttpMethod::Get, "/api-clients/1").unwrap();
//! assert_eq!(route.operation.name, "api_client_get");
//! assert_eq!(route.uri_variables["apiClientId"], 1);
//! assert!(registry.resolve(HttpMethod::Get, "/api-clients/abc").is_none());
//! ```

use crate::error::{ErrorKind, RegistryError};
use crate::mapping::MappingTable;
use crate::path::PropertyPath;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Path-extracted values of a request, keyed by template variable name.
pub type UriVariables = Map<String, Value>;

/// HTTP verbs an operation can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn is_read(self) -> bool {
        self == HttpMethod::Get
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        };
        f.write_str(verb)
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("Unsupported HTTP method: {other}")),
        }
    }
}

/// Declared type of a resource field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Int,
    Float,
    Bool,
    String,
    /// Map of locale to translated string.
    Localized,
    Array,
    Object,
    /// Uploaded file reference (multipart only).
    File,
    Any,
}

impl FieldType {
    /// Whether `value` is acceptable for this type. `null` is handled by the caller.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::String => value.is_string(),
            FieldType::Localized => value
                .as_object()
                .is_some_and(|m| m.values().all(|v| v.is_string() || v.is_null())),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::File | FieldType::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
    pub nullable: bool,
}

/// Error kind → HTTP status, declared per resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionTable {
    statuses: HashMap<ErrorKind, u16>,
}

impl ExceptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, kind: ErrorKind, status: u16) -> Self {
        self.statuses.insert(kind, status);
        self
    }

    /// Status for `kind`; anything undeclared is a generic server error.
    pub fn status_for(&self, kind: ErrorKind) -> u16 {
        self.statuses.get(&kind).copied().unwrap_or(500)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizationOptions {
    pub skip_null_values: bool,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        Self {
            skip_null_values: true,
        }
    }
}

/// How a write operation's body arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Json,
    /// `multipart/form-data`; form values are strings, so type checks are usually off.
    Multipart { enforce_types: bool },
}

impl InputFormat {
    pub fn enforces_types(self) -> bool {
        match self {
            InputFormat::Json => true,
            InputFormat::Multipart { enforce_types } => enforce_types,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    #[default]
    Resource,
    NoContent,
}

/// Stamps a URI variable onto every element of an unwrapped collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentStamp {
    pub uri_variable: String,
    pub field: String,
}

/// Unwraps an aggregate result into its inner collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionUnwrap {
    pub inner: PropertyPath,
    pub parent: Option<ParentStamp>,
}

/// Which provider serves a read operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProviderKind {
    #[default]
    Query,
    UnwrapCollection(CollectionUnwrap),
    /// Named grid data source.
    Grid(String),
}

/// Which processor serves a write operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProcessorKind {
    #[default]
    Command,
    /// Named custom action processor.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TemplatePart {
    Literal(String),
    Variable(String),
}

/// A URI template such as `/cart/{cartId}/products`.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    raw: String,
    parts: Vec<TemplatePart>,
    matcher: Regex,
}

impl UriTemplate {
    fn compile(raw: &str, requirements: &HashMap<String, String>) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidTemplate {
            template: raw.to_string(),
            reason: reason.to_string(),
        };
        if !raw.starts_with('/') {
            return Err(invalid("must start with `/`"));
        }

        let mut parts = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                parts.push(TemplatePart::Literal(rest[..open].to_string()));
            }
            let close = rest[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| invalid("unclosed `{`"))?;
            let name = &rest[open + 1..close];
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(invalid("variable names must be alphanumeric"));
            }
            parts.push(TemplatePart::Variable(name.to_string()));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            parts.push(TemplatePart::Literal(rest.to_string()));
        }

        let mut pattern = String::from("^");
        for part in &parts {
            match part {
                TemplatePart::Literal(text) => pattern.push_str(&regex::escape(text)),
                TemplatePart::Variable(name) => {
                    let requirement = requirements.get(name).map(String::as_str).unwrap_or("[^/]+");
                    Regex::new(requirement).map_err(|e| RegistryError::InvalidRequirement {
                        variable: name.clone(),
                        reason: e.to_string(),
                    })?;
                    pattern.push_str(&format!("(?P<{name}>{requirement})"));
                }
            }
        }
        pattern.push('$');

        let matcher = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            parts,
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            TemplatePart::Variable(name) => Some(name.as_str()),
            TemplatePart::Literal(_) => None,
        })
    }

    /// Extracts variables from `path`, or `None` when it does not match.
    ///
    /// Purely numeric segments become JSON numbers.
    pub fn matches(&self, path: &str) -> Option<UriVariables> {
        let captures = self.matcher.captures(path)?;
        let mut variables = UriVariables::new();
        for name in self.variables() {
            let raw = captures.name(name)?.as_str();
            let value = raw
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
            variables.insert(name.to_string(), value);
        }
        Some(variables)
    }
}

/// One HTTP verb + path bound to CQRS objects and rename tables.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub method: HttpMethod,
    pub template: UriTemplate,
    pub scopes: Vec<String>,
    pub command: Option<String>,
    pub query: Option<String>,
    /// Resource field → command field.
    pub command_mapping: MappingTable,
    /// Resource field → query field.
    pub query_mapping: MappingTable,
    /// Query result field → resource field.
    pub result_mapping: MappingTable,
    pub input: InputFormat,
    pub output: OutputKind,
    pub provider: ProviderKind,
    pub processor: ProcessorKind,
    /// Copy URI variables onto the returned resource.
    pub uri_variables_in_result: bool,
}

impl Operation {
    pub fn get(name: &str, template: &str) -> OperationBuilder {
        OperationBuilder::new(name, HttpMethod::Get, template)
    }

    pub fn post(name: &str, template: &str) -> OperationBuilder {
        OperationBuilder::new(name, HttpMethod::Post, template)
    }

    pub fn put(name: &str, template: &str) -> OperationBuilder {
        OperationBuilder::new(name, HttpMethod::Put, template)
    }

    pub fn patch(name: &str, template: &str) -> OperationBuilder {
        OperationBuilder::new(name, HttpMethod::Patch, template)
    }

    pub fn delete(name: &str, template: &str) -> OperationBuilder {
        OperationBuilder::new(name, HttpMethod::Delete, template)
    }
}

type Pairs = Vec<(String, String)>;

/// Fluent declaration of an [`Operation`]; compiled by the registry.
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    name: String,
    method: HttpMethod,
    template: String,
    requirements: HashMap<String, String>,
    scopes: Vec<String>,
    command: Option<String>,
    query: Option<String>,
    command_mapping: Pairs,
    query_mapping: Pairs,
    result_mapping: Pairs,
    input: InputFormat,
    output: OutputKind,
    provider: ProviderKind,
    unwrap: Option<(String, Option<ParentStamp>)>,
    processor: ProcessorKind,
    uri_variables_in_result: bool,
}

fn to_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Pairs {
    pairs
        .into_iter()
        .map(|(s, d)| (s.to_string(), d.to_string()))
        .collect()
}

impl OperationBuilder {
    fn new(name: &str, method: HttpMethod, template: &str) -> Self {
        Self {
            name: name.to_string(),
            method,
            template: template.to_string(),
            requirements: HashMap::new(),
            scopes: Vec::new(),
            command: None,
            query: None,
            command_mapping: Vec::new(),
            query_mapping: Vec::new(),
            result_mapping: Vec::new(),
            input: InputFormat::Json,
            output: OutputKind::Resource,
            provider: ProviderKind::Query,
            unwrap: None,
            processor: ProcessorKind::Command,
            uri_variables_in_result: false,
        }
    }

    /// Regex a URI variable must match (`\d+` for numeric ids).
    pub fn requirement(mut self, variable: &str, pattern: &str) -> Self {
        self.requirements
            .insert(variable.to_string(), pattern.to_string());
        self
    }

    pub fn scopes<'a>(mut self, scopes: impl IntoIterator<Item = &'a str>) -> Self {
        self.scopes = scopes.into_iter().map(str::to_string).collect();
        self
    }

    pub fn command(mut self, command: &str) -> Self {
        self.command = Some(command.to_string());
        self
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn command_mapping<'a>(
        mut self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.command_mapping = to_pairs(pairs);
        self
    }

    pub fn query_mapping<'a>(
        mut self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.query_mapping = to_pairs(pairs);
        self
    }

    pub fn result_mapping<'a>(
        mut self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.result_mapping = to_pairs(pairs);
        self
    }

    pub fn multipart(mut self, enforce_types: bool) -> Self {
        self.input = InputFormat::Multipart { enforce_types };
        self
    }

    pub fn no_content(mut self) -> Self {
        self.output = OutputKind::NoContent;
        self
    }

    /// Serve through the unwrapping provider: `inner` locates the collection
    /// inside the aggregate, `parent` is `(uri variable, field)` to stamp on items.
    pub fn unwrap_collection(mut self, inner: &str, parent: Option<(&str, &str)>) -> Self {
        self.unwrap = Some((
            inner.to_string(),
            parent.map(|(uri_variable, field)| ParentStamp {
                uri_variable: uri_variable.to_string(),
                field: field.to_string(),
            }),
        ));
        self
    }

    pub fn grid(mut self, grid: &str) -> Self {
        self.provider = ProviderKind::Grid(grid.to_string());
        self
    }

    pub fn custom_processor(mut self, processor: &str) -> Self {
        self.processor = ProcessorKind::Custom(processor.to_string());
        self
    }

    pub fn uri_variables_in_result(mut self) -> Self {
        self.uri_variables_in_result = true;
        self
    }

    pub fn build(self) -> Result<Operation, RegistryError> {
        let table = |pairs: &Pairs| {
            MappingTable::from_pairs(pairs.iter().map(|(s, d)| (s.as_str(), d.as_str()))).map_err(
                |error| RegistryError::InvalidMapping {
                    operation: self.name.clone(),
                    error,
                },
            )
        };
        let command_mapping = table(&self.command_mapping)?;
        let query_mapping = table(&self.query_mapping)?;
        let result_mapping = table(&self.result_mapping)?;
        let template = UriTemplate::compile(&self.template, &self.requirements)?;
        let provider = match self.unwrap {
            Some((inner, parent)) => ProviderKind::UnwrapCollection(CollectionUnwrap {
                inner: inner
                    .parse::<PropertyPath>()
                    .map_err(|error| RegistryError::InvalidMapping {
                        operation: self.name.clone(),
                        error,
                    })?,
                parent,
            }),
            None => self.provider,
        };

        Ok(Operation {
            name: self.name,
            method: self.method,
            template,
            scopes: self.scopes,
            command: self.command,
            query: self.query,
            command_mapping,
            query_mapping,
            result_mapping,
            input: self.input,
            output: self.output,
            provider,
            processor: self.processor,
            uri_variables_in_result: self.uri_variables_in_result,
        })
    }
}

/// A declared API entity.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    pub name: String,
    pub identifier: Option<String>,
    pub fields: Vec<FieldSpec>,
    pub exceptions: ExceptionTable,
    pub normalization: NormalizationOptions,
    operations: Vec<OperationBuilder>,
}

impl ResourceDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            identifier: None,
            fields: Vec::new(),
            exceptions: ExceptionTable::new(),
            normalization: NormalizationOptions::default(),
            operations: Vec::new(),
        }
    }

    pub fn identifier(mut self, field: &str) -> Self {
        self.identifier = Some(field.to_string());
        self
    }

    pub fn field(self, name: &str, ty: FieldType) -> Self {
        self.push_field(name, ty, false)
    }

    pub fn nullable_field(self, name: &str, ty: FieldType) -> Self {
        self.push_field(name, ty, true)
    }

    fn push_field(mut self, name: &str, ty: FieldType, nullable: bool) -> Self {
        self.fields.push(FieldSpec {
            name: name.to_string(),
            ty,
            nullable,
        });
        self
    }

    pub fn operation(mut self, operation: OperationBuilder) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn exception(mut self, kind: ErrorKind, status: u16) -> Self {
        self.exceptions = self.exceptions.map(kind, status);
        self
    }

    pub fn skip_null_values(mut self, skip: bool) -> Self {
        self.normalization.skip_null_values = skip;
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A resource with its compiled operations.
#[derive(Debug, Clone)]
pub struct Resource {
    pub descriptor: ResourceDescriptor,
    pub operations: Vec<Operation>,
}

/// The outcome of route resolution.
#[derive(Debug, Clone)]
pub struct ResolvedRoute<'a> {
    pub resource: &'a Resource,
    pub operation: &'a Operation,
    pub uri_variables: UriVariables,
}

/// Immutable table of every declared resource.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    resources: Vec<Resource>,
}

impl ResourceRegistry {
    pub fn new(descriptors: Vec<ResourceDescriptor>) -> Result<Self, RegistryError> {
        let mut names = HashSet::new();
        let mut routes = HashSet::new();
        let mut resources = Vec::with_capacity(descriptors.len());

        for mut descriptor in descriptors {
            let builders = std::mem::take(&mut descriptor.operations);
            let mut operations = Vec::with_capacity(builders.len());
            for builder in builders {
                let operation = builder.build()?;
                if !names.insert(operation.name.clone()) {
                    return Err(RegistryError::DuplicateOperation(operation.name));
                }
                if !routes.insert((operation.method, operation.template.as_str().to_string())) {
                    return Err(RegistryError::DuplicateRoute {
                        method: operation.method.to_string(),
                        template: operation.template.as_str().to_string(),
                    });
                }
                operations.push(operation);
            }
            resources.push(Resource {
                descriptor,
                operations,
            });
        }

        Ok(Self { resources })
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.descriptor.name == name)
    }

    pub fn operation(&self, name: &str) -> Option<(&Resource, &Operation)> {
        self.resources.iter().find_map(|r| {
            r.operations
                .iter()
                .find(|o| o.name == name)
                .map(|o| (r, o))
        })
    }

    /// Finds the operation serving `method path`.
    pub fn resolve(&self, method: HttpMethod, path: &str) -> Option<ResolvedRoute<'_>> {
        self.resources.iter().find_map(|resource| {
            resource
                .operations
                .iter()
                .filter(|o| o.method == method)
                .find_map(|operation| {
                    operation
                        .template
                        .matches(path)
                        .map(|uri_variables| ResolvedRoute {
                            resource,
                            operation,
                            uri_variables,
                        })
                })
        })
    }
}
