//! Request-scoped ambient context.
//!
//! The current shop, language, currency and employee travel with each request
//! as a plain value. Providers read them from here, never from process-wide state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A language known to the shop: numeric id plus its locale (`en-US`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: u32,
    pub locale: String,
}

/// Lookup between language ids and locales, used for localized fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
}

impl LanguageCatalog {
    pub fn new(languages: Vec<Language>) -> Self {
        Self { languages }
    }

    pub fn locale_of(&self, id: u32) -> Option<&str> {
        self.languages
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.locale.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn id_of(&self, locale: &str) -> Option<u32> {
        self.languages
            .iter()
            .find(|l| l.locale.eq_ignore_ascii_case(locale))
            .map(|l| l.id)
    }
}

/// Per-request context handed to providers and processors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub shop_id: Option<u32>,
    pub language_id: Option<u32>,
    pub currency_id: Option<u32>,
    pub employee_id: Option<u32>,
    #[serde(default)]
    pub languages: LanguageCatalog,
    /// Query-string filters of the current request.
    #[serde(default)]
    pub filters: Map<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shop(mut self, shop_id: u32) -> Self {
        self.shop_id = Some(shop_id);
        self
    }

    pub fn with_language(mut self, language_id: u32) -> Self {
        self.language_id = Some(language_id);
        self
    }

    pub fn with_currency(mut self, currency_id: u32) -> Self {
        self.currency_id = Some(currency_id);
        self
    }

    pub fn with_employee(mut self, employee_id: u32) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn with_languages(mut self, languages: LanguageCatalog) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_filter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.filters.insert(name.into(), value);
        self
    }

    /// Ambient parameters exposed to query/command construction.
    pub fn parameters(&self) -> Map<String, Value> {
        let mut params = Map::new();
        let ambient = [
            ("shopId", self.shop_id),
            ("langId", self.language_id),
            ("currencyId", self.currency_id),
            ("employeeId", self.employee_id),
        ];
        for (name, value) in ambient {
            if let Some(id) = value {
                params.insert(name.to_string(), Value::from(id));
            }
        }
        params
    }
}

/// Merges parameter layers; later layers win on key collision.
///
/// Callers pass `context, filters, body, uri variables` in that order so URI
/// variables always take precedence.
pub fn merge_parameters<'a, I>(layers: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameters_skip_unset_ambient_values() {
        let ctx = RequestContext::new().with_shop(1).with_employee(4);
        let params = ctx.parameters();
        assert_eq!(params.get("shopId"), Some(&json!(1)));
        assert_eq!(params.get("employeeId"), Some(&json!(4)));
        assert!(!params.contains_key("langId"));
    }

    #[test]
    fn test_later_layers_win() {
        let ambient = json!({"shopId": 1, "cartId": 9}).as_object().cloned().unwrap();
        let uri = json!({"cartId": 3}).as_object().cloned().unwrap();
        let merged = merge_parameters([&ambient, &uri]);
        assert_eq!(merged.get("cartId"), Some(&json!(3)));
        assert_eq!(merged.get("shopId"), Some(&json!(1)));
    }

    #[test]
    fn test_language_catalog_lookup() {
        let catalog = LanguageCatalog::new(vec![
            Language { id: 1, locale: "en-US".into() },
            Language { id: 2, locale: "fr-FR".into() },
        ]);
        assert_eq!(catalog.locale_of(2), Some("fr-FR"));
        assert_eq!(catalog.id_of("EN-us"), Some(1));
        assert_eq!(catalog.id_of("de-DE"), None);
    }
}
