//! (De)normalization between untyped JSON and resource shapes.
//!
//! Denormalization builds a resource instance out of a mapped CQRS result;
//! normalization produces the response body from it. Input validation of write
//! bodies also lives here because it shares the field declarations.

use crate::context::LanguageCatalog;
use crate::error::ApiError;
use crate::resource::{FieldType, InputFormat, ResourceDescriptor, UriVariables};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

pub struct Normalizer;

impl Normalizer {
    /// Builds a resource instance from mapped data.
    ///
    /// Only declared fields are kept and declared-but-missing ones are set to
    /// `null`; a resource without declared fields keeps everything. Localized
    /// values arrive keyed by language id and leave keyed by locale.
    pub fn denormalize(
        data: Value,
        descriptor: &ResourceDescriptor,
        languages: &LanguageCatalog,
        uri_variables: Option<&UriVariables>,
    ) -> Result<Value, ApiError> {
        let mut source = match data {
            Value::Object(map) => map,
            other => {
                return Err(ApiError::Transformation(format!(
                    "{} expects an object, got {}",
                    descriptor.name,
                    kind_of(&other)
                )))
            }
        };

        let mut resource = if descriptor.fields.is_empty() {
            source
        } else {
            let mut resource = Map::new();
            for field in &descriptor.fields {
                let value = source.remove(&field.name).unwrap_or(Value::Null);
                let value = match field.ty {
                    FieldType::Localized => localized_to_locales(value, languages),
                    _ => value,
                };
                resource.insert(field.name.clone(), value);
            }
            resource
        };

        if let Some(variables) = uri_variables {
            for (name, value) in variables {
                let declared =
                    descriptor.fields.is_empty() || descriptor.field_spec(name).is_some();
                let unset = resource.get(name).map_or(true, Value::is_null);
                if declared && unset {
                    resource.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(Value::Object(resource))
    }

    /// A resource with every declared field set to `null`.
    pub fn blank(descriptor: &ResourceDescriptor) -> Value {
        Value::Object(
            descriptor
                .fields
                .iter()
                .map(|f| (f.name.clone(), Value::Null))
                .collect(),
        )
    }

    /// Produces the response body, honouring `skip_null_values`.
    pub fn normalize(resource: Value, descriptor: &ResourceDescriptor) -> Value {
        if descriptor.normalization.skip_null_values {
            strip_nulls(resource)
        } else {
            resource
        }
    }

    /// Checks a write body against the declared fields.
    ///
    /// With type enforcement on, every declared field must match its type.
    /// Without it (multipart forms) string values are coerced where they parse.
    pub fn validate_input(
        body: Map<String, Value>,
        descriptor: &ResourceDescriptor,
        input: InputFormat,
        languages: &LanguageCatalog,
    ) -> Result<Map<String, Value>, ApiError> {
        let enforce = input.enforces_types();
        let mut validated = Map::new();

        for (name, value) in body {
            let Some(field) = descriptor.field_spec(&name) else {
                validated.insert(name, value);
                continue;
            };

            if value.is_null() {
                if !field.nullable {
                    return Err(ApiError::Validation {
                        field: name,
                        message: "must not be null".into(),
                    });
                }
                validated.insert(name, value);
                continue;
            }

            let value = if enforce { value } else { coerce(value, field.ty) };
            if enforce && !field.ty.accepts(&value) {
                return Err(ApiError::Validation {
                    field: name,
                    message: format!("expected {:?}, got {}", field.ty, kind_of(&value)),
                });
            }

            let value = match field.ty {
                FieldType::Localized => locales_to_ids(&name, value, languages)?,
                _ => value,
            };
            validated.insert(name, value);
        }

        Ok(validated)
    }

    /// Decodes an untyped payload into a typed DTO.
    pub fn to_typed<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
        Ok(serde_json::from_value(value)?)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

fn coerce(value: Value, ty: FieldType) -> Value {
    let Value::String(raw) = &value else {
        return value;
    };
    let coerced = match ty {
        FieldType::Int => raw.trim().parse::<i64>().ok().map(Value::from),
        FieldType::Float => raw.trim().parse::<f64>().ok().map(Value::from),
        FieldType::Bool => match raw.trim() {
            "1" | "true" => Some(Value::Bool(true)),
            "0" | "false" | "" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    coerced.unwrap_or(value)
}

fn localized_to_locales(value: Value, languages: &LanguageCatalog) -> Value {
    let by_id = match value {
        Value::Object(map) => map,
        other => return other,
    };
    let mut by_locale = Map::new();
    for (key, text) in by_id {
        match key.parse::<u32>().ok().and_then(|id| languages.locale_of(id)) {
            Some(locale) => {
                by_locale.insert(locale.to_string(), text);
            }
            None if languages.id_of(&key).is_some() => {
                by_locale.insert(key, text);
            }
            None => warn!(language = %key, "Dropping value for unknown language"),
        }
    }
    Value::Object(by_locale)
}

fn locales_to_ids(
    field: &str,
    value: Value,
    languages: &LanguageCatalog,
) -> Result<Value, ApiError> {
    let by_locale = match value {
        Value::Object(map) => map,
        other => return Ok(other),
    };
    let mut by_id = Map::new();
    for (locale, text) in by_locale {
        let id = languages.id_of(&locale).ok_or_else(|| ApiError::Validation {
            field: field.to_string(),
            message: format!("unknown locale `{locale}`"),
        })?;
        by_id.insert(id.to_string(), text);
    }
    Ok(Value::Object(by_id))
}
