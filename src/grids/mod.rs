//! Grid row sources backing the list endpoints.

pub mod module;

pub use module::{InMemoryModuleRepository, InstalledVersionEnricher, ModuleRepository};

use async_trait::async_trait;
use resource_framework::{GridData, GridDataSource, GridError, SearchCriteria, SortOrder};
use serde_json::Value;
use std::cmp::Ordering;
use tracing::debug;

/// A grid over a fixed set of raw rows.
///
/// Filters match on equality, except string filters which match as a
/// case-insensitive substring. Sorting compares numbers numerically and
/// everything else as text.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGrid {
    rows: Vec<Value>,
}

impl InMemoryGrid {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl GridDataSource for InMemoryGrid {
    async fn get_data(&self, criteria: &SearchCriteria) -> Result<GridData, GridError> {
        let mut rows: Vec<Value> = self
            .rows
            .iter()
            .filter(|row| {
                criteria
                    .filters
                    .iter()
                    .all(|f| matches_filter(row.get(&f.field), &f.value))
            })
            .cloned()
            .collect();

        if let Some(column) = &criteria.order_by {
            rows.sort_by(|a, b| compare(a.get(column), b.get(column)));
            if criteria.sort_order == SortOrder::Desc {
                rows.reverse();
            }
        }

        let total = rows.len() as u64;
        let records: Vec<Value> = rows
            .into_iter()
            .skip(criteria.offset)
            .take(criteria.limit)
            .collect();
        debug!(total, returned = records.len(), "In-memory grid queried");
        Ok(GridData { records, total })
    }
}

fn matches_filter(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (Some(Value::String(actual)), Value::String(expected)) => actual
            .to_lowercase()
            .contains(&expected.to_lowercase()),
        (Some(Value::Bool(actual)), Value::String(expected)) => {
            matches!((*actual, expected.as_str()), (true, "1" | "true") | (false, "0" | "false"))
        }
        (Some(actual), expected) => actual == expected,
        (None, _) => false,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => text(a).cmp(&text(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_lowercase(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::grid::Filter;
    use resource_framework::PageLimits;
    use serde_json::json;

    fn grid() -> InMemoryGrid {
        InMemoryGrid::new(vec![
            json!({"id_api_client": 1, "client_name": "ERP", "enabled": true}),
            json!({"id_api_client": 2, "client_name": "Mailer", "enabled": false}),
            json!({"id_api_client": 3, "client_name": "erp sync", "enabled": true}),
        ])
    }

    #[tokio::test]
    async fn test_filters_sort_and_window() {
        let mut criteria = SearchCriteria::new(PageLimits::default());
        criteria.filters.push(Filter {
            field: "client_name".into(),
            value: json!("erp"),
        });
        criteria.order_by = Some("id_api_client".into());
        criteria.sort_order = SortOrder::Desc;
        criteria.limit = 1;

        let data = grid().get_data(&criteria).await.unwrap();
        assert_eq!(data.total, 2);
        assert_eq!(
            data.records,
            vec![json!({"id_api_client": 3, "client_name": "erp sync", "enabled": true})]
        );
    }

    #[tokio::test]
    async fn test_boolean_filter_accepts_query_string_values() {
        let mut criteria = SearchCriteria::new(PageLimits::default());
        criteria.filters.push(Filter {
            field: "enabled".into(),
            value: json!("0"),
        });
        let data = grid().get_data(&criteria).await.unwrap();
        assert_eq!(data.total, 1);
        assert_eq!(data.records[0]["id_api_client"], 2);
    }
}
