//! Runtime settings, loadable from JSON with defaults for every field.

use resource_framework::{Language, LanguageCatalog, PageLimits, RequestContext};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub default_page_limit: usize,
    pub max_page_limit: usize,
    pub default_shop_id: u32,
    pub default_language_id: u32,
    pub default_currency_id: u32,
    pub languages: Vec<Language>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_page_limit: 50,
            max_page_limit: 100,
            default_shop_id: 1,
            default_language_id: 1,
            default_currency_id: 1,
            languages: vec![
                Language {
                    id: 1,
                    locale: "en-US".into(),
                },
                Language {
                    id: 2,
                    locale: "fr-FR".into(),
                },
            ],
        }
    }
}

impl ApiSettings {
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.default_page_limit == 0 {
            return Err(SettingsError::Invalid("default_page_limit must be positive".into()));
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(SettingsError::Invalid(
                "default_page_limit exceeds max_page_limit".into(),
            ));
        }
        Ok(())
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }

    /// A request context preset with the shop defaults.
    pub fn context(&self) -> RequestContext {
        RequestContext::new()
            .with_shop(self.default_shop_id)
            .with_language(self.default_language_id)
            .with_currency(self.default_currency_id)
            .with_languages(LanguageCatalog::new(self.languages.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings = ApiSettings::from_json(r#"{"max_page_limit": 250}"#).unwrap();
        assert_eq!(settings.max_page_limit, 250);
        assert_eq!(settings.default_page_limit, 50);
        assert_eq!(settings.languages.len(), 2);
    }

    #[test]
    fn test_inconsistent_limits_are_rejected() {
        let err = ApiSettings::from_json(r#"{"default_page_limit": 500}"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_context_carries_defaults() {
        let ctx = ApiSettings::default().context();
        assert_eq!(ctx.shop_id, Some(1));
        assert_eq!(ctx.languages.locale_of(2), Some("fr-FR"));
    }
}
