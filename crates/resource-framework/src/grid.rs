//! # Grid List Provider
//!
//! Paginated collection endpoints are served from a legacy row source (a
//! "grid") rather than from a CQRS query. Rows can be augmented by
//! [`RowEnricher`]s before the operation's result table renames them.
//!
//! A failing row source or enricher never reaches the client: the provider logs
//! the error and answers with a well-formed empty [`PaginatedList`].

use crate::context::RequestContext;
use crate::error::{ApiError, GridError};
use crate::mapping::MappingTable;
use crate::normalizer::Normalizer;
use crate::resource::{Operation, ProviderKind, Resource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// A single column filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// Page size bounds applied to every list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
        }
    }
}

/// Filters, sort and page window of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCriteria {
    pub filters: Vec<Filter>,
    pub order_by: Option<String>,
    pub sort_order: SortOrder,
    pub offset: usize,
    pub limit: usize,
}

impl SearchCriteria {
    pub fn new(limits: PageLimits) -> Self {
        Self {
            filters: Vec::new(),
            order_by: None,
            sort_order: SortOrder::Asc,
            offset: 0,
            limit: limits.default_limit,
        }
    }

    /// Reads `limit`, `offset`, `orderBy` and `sortOrder` from the request
    /// filters; every other entry becomes a column filter.
    ///
    /// A missing, zero or unparsable limit falls back to the default; larger
    /// ones are clamped to the maximum.
    pub fn from_request(params: &Map<String, Value>, limits: PageLimits) -> Self {
        let mut criteria = Self::new(limits);
        for (name, value) in params {
            match name.as_str() {
                "limit" => {
                    criteria.limit = match as_usize(value) {
                        Some(0) | None => limits.default_limit,
                        Some(limit) => limit.min(limits.max_limit),
                    }
                }
                "offset" => criteria.offset = as_usize(value).unwrap_or(0),
                "orderBy" => criteria.order_by = value.as_str().map(str::to_string),
                "sortOrder" => {
                    criteria.sort_order = value
                        .as_str()
                        .and_then(SortOrder::parse)
                        .unwrap_or_default()
                }
                _ => criteria.filters.push(Filter {
                    field: name.clone(),
                    value: value.clone(),
                }),
            }
        }
        criteria
    }
}

fn as_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Rows returned by a grid, plus the unpaginated total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridData {
    pub records: Vec<Value>,
    pub total: u64,
}

#[async_trait]
pub trait GridDataSource: Send + Sync {
    async fn get_data(&self, criteria: &SearchCriteria) -> Result<GridData, GridError>;
}

/// Augments one grid row, e.g. by joining a secondary lookup.
#[async_trait]
pub trait RowEnricher: Send + Sync {
    async fn enrich(&self, row: Value) -> Result<Value, GridError>;
}

/// The collection envelope returned by list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedList {
    pub items: Vec<Value>,
    pub total_items: u64,
    pub limit: usize,
    pub sort_order: SortOrder,
    pub filters: Vec<Filter>,
}

impl PaginatedList {
    pub fn empty(criteria: &SearchCriteria) -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            limit: criteria.limit,
            sort_order: criteria.sort_order,
            filters: Vec::new(),
        }
    }
}

/// Serves [`ProviderKind::Grid`] operations from registered grids.
#[derive(Clone, Default)]
pub struct GridListProvider {
    grids: HashMap<String, Arc<dyn GridDataSource>>,
    enrichers: HashMap<String, Vec<Arc<dyn RowEnricher>>>,
}

impl GridListProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, grid: &str, source: Arc<dyn GridDataSource>) -> Self {
        self.grids.insert(grid.to_string(), source);
        self
    }

    /// Adds an enricher run on every row of `grid`, in registration order.
    pub fn enrich(mut self, grid: &str, enricher: Arc<dyn RowEnricher>) -> Self {
        self.enrichers
            .entry(grid.to_string())
            .or_default()
            .push(enricher);
        self
    }

    /// Lists the rows of the operation's grid.
    ///
    /// Only configuration mistakes fail; backing failures degrade to
    /// [`PaginatedList::empty`].
    pub async fn provide(
        &self,
        resource: &Resource,
        operation: &Operation,
        criteria: &SearchCriteria,
        ctx: &RequestContext,
    ) -> Result<PaginatedList, ApiError> {
        let ProviderKind::Grid(grid) = &operation.provider else {
            return Err(ApiError::GridNotRegistered(operation.name.clone()));
        };
        let source = self
            .grids
            .get(grid)
            .ok_or_else(|| ApiError::GridNotRegistered(grid.clone()))?;

        let source_criteria = to_source_columns(criteria, &operation.result_mapping);
        debug!(grid = %grid, criteria = ?source_criteria, "Fetching grid rows");
        let rows = match self.fetch(grid, source.as_ref(), &source_criteria).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(
                    grid = %grid,
                    operation = %operation.name,
                    error = %e,
                    "Grid failed, returning empty list"
                );
                return Ok(PaginatedList::empty(criteria));
            }
        };

        let mut items = Vec::with_capacity(rows.records.len());
        for row in rows.records {
            let mapped = operation.result_mapping.apply(&row);
            items.push(Normalizer::denormalize(
                mapped,
                &resource.descriptor,
                &ctx.languages,
                None,
            )?);
        }

        info!(grid = %grid, count = items.len(), total = rows.total, "Grid served");
        Ok(PaginatedList {
            items,
            total_items: rows.total,
            limit: criteria.limit,
            sort_order: criteria.sort_order,
            filters: criteria.filters.clone(),
        })
    }

    async fn fetch(
        &self,
        grid: &str,
        source: &dyn GridDataSource,
        criteria: &SearchCriteria,
    ) -> Result<GridData, GridError> {
        let mut data = source.get_data(criteria).await?;
        if let Some(enrichers) = self.enrichers.get(grid) {
            let mut enriched = Vec::with_capacity(data.records.len());
            for mut row in data.records {
                for enricher in enrichers {
                    row = enricher.enrich(row).await?;
                }
                enriched.push(row);
            }
            data.records = enriched;
        }
        Ok(data)
    }
}

/// Filters and sort arrive with API field names; grids know their own columns.
fn to_source_columns(criteria: &SearchCriteria, mapping: &MappingTable) -> SearchCriteria {
    let column = |field: &str| {
        mapping
            .entries()
            .iter()
            .find(|m| m.destination.to_string() == field)
            .map_or_else(|| field.to_string(), |m| m.source.to_string())
    };
    SearchCriteria {
        filters: criteria
            .filters
            .iter()
            .map(|f| Filter {
                field: column(&f.field),
                value: f.value.clone(),
            })
            .collect(),
        order_by: criteria.order_by.as_deref().map(column),
        ..criteria.clone()
    }
}
