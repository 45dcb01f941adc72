//! Installed-version lookup for the module grid.

use async_trait::async_trait;
use resource_framework::{GridError, RowEnricher};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Knows which modules are installed, and at which version.
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    async fn installed_version(&self, technical_name: &str) -> Result<Option<String>, GridError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryModuleRepository {
    installed: HashMap<String, String>,
    unavailable: bool,
}

impl InMemoryModuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installed(mut self, technical_name: &str, version: &str) -> Self {
        self.installed
            .insert(technical_name.to_string(), version.to_string());
        self
    }

    /// Every lookup fails, as when the module database is unreachable.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ModuleRepository for InMemoryModuleRepository {
    async fn installed_version(&self, technical_name: &str) -> Result<Option<String>, GridError> {
        if self.unavailable {
            return Err(GridError::Backend("module repository unavailable".into()));
        }
        Ok(self.installed.get(technical_name).cloned())
    }
}

/// Sets `installed_version` on each module row from the repository.
pub struct InstalledVersionEnricher {
    repository: Arc<dyn ModuleRepository>,
}

impl InstalledVersionEnricher {
    pub fn new(repository: Arc<dyn ModuleRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RowEnricher for InstalledVersionEnricher {
    async fn enrich(&self, mut row: Value) -> Result<Value, GridError> {
        let name = row
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GridError::Enrichment("module row without a name".into()))?
            .to_string();
        let version = self.repository.installed_version(&name).await?;
        if let Value::Object(map) = &mut row {
            map.insert(
                "installed_version".to_string(),
                version.map_or(Value::Null, Value::String),
            );
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_enricher_joins_installed_version() {
        let repository = InMemoryModuleRepository::new().with_installed("ps_banner", "2.1.0");
        let enricher = InstalledVersionEnricher::new(Arc::new(repository));

        let row = enricher.enrich(json!({"name": "ps_banner"})).await.unwrap();
        assert_eq!(row["installed_version"], "2.1.0");

        let row = enricher.enrich(json!({"name": "ps_other"})).await.unwrap();
        assert_eq!(row["installed_version"], Value::Null);
    }

    #[tokio::test]
    async fn test_enricher_fails_on_nameless_rows() {
        let enricher = InstalledVersionEnricher::new(Arc::new(InMemoryModuleRepository::new()));
        assert!(enricher.enrich(json!({"id_module": 1})).await.is_err());
    }
}
