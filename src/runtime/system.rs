use crate::grids::{InstalledVersionEnricher, ModuleRepository};
use crate::order_actions::{LegacyOrderStore, OrderActionProcessor};
use crate::resources::{self, API_CLIENT_GRID, MODULE_GRID, ORDER_ACTIONS};
use crate::runtime::settings::ApiSettings;
use resource_framework::{
    ApiKernel, ApiRequest, ApiResponse, CommandBus, GridDataSource, GridListProvider, QueryBus,
    RegistryError, RequestContext,
};
use std::sync::Arc;
use tracing::info;

/// External systems the API adapts to.
#[derive(Clone)]
pub struct Collaborators {
    pub queries: Arc<dyn QueryBus>,
    pub commands: Arc<dyn CommandBus>,
    pub orders: Arc<dyn LegacyOrderStore>,
    pub api_client_grid: Arc<dyn GridDataSource>,
    pub module_grid: Arc<dyn GridDataSource>,
    pub modules: Arc<dyn ModuleRepository>,
}

/// The wired API: resource registry, kernel, providers and processors.
///
/// `ApiSystem` is responsible for:
/// - **Registration**: building the immutable resource registry once
/// - **Wiring**: connecting grids, enrichers and the order action processor
///   to the kernel
/// - **Defaults**: filling unset request context values from the settings
///
/// # Example
///
/// ```ignore
/// let system = ApiSystem::new(ApiSettings::default(), collaborators)?;
/// let response = system.handle(ApiRequest::get("/api-clients/1")).await;
/// assert_eq!(response.status, 200);
/// ```
pub struct ApiSystem {
    kernel: ApiKernel,
    settings: ApiSettings,
}

impl ApiSystem {
    pub fn new(settings: ApiSettings, collaborators: Collaborators) -> Result<Self, RegistryError> {
        let registry = Arc::new(resources::registry()?);
        info!(
            resources = registry.resources().len(),
            "Resource registry built"
        );

        let grids = GridListProvider::new()
            .register(API_CLIENT_GRID, collaborators.api_client_grid)
            .register(MODULE_GRID, collaborators.module_grid)
            .enrich(
                MODULE_GRID,
                Arc::new(InstalledVersionEnricher::new(collaborators.modules)),
            );

        let kernel = ApiKernel::new(registry, collaborators.queries, collaborators.commands)
            .with_grids(grids)
            .with_page_limits(settings.page_limits())
            .with_action_processor(
                ORDER_ACTIONS,
                Arc::new(OrderActionProcessor::new(collaborators.orders)),
            );

        Ok(Self { kernel, settings })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn kernel(&self) -> &ApiKernel {
        &self.kernel
    }

    /// Serves one request, completing its context from the settings.
    pub async fn handle(&self, mut request: ApiRequest) -> ApiResponse {
        request.context = self.complete_context(request.context);
        self.kernel.handle(request).await
    }

    fn complete_context(&self, ctx: RequestContext) -> RequestContext {
        let defaults = self.settings.context();
        RequestContext {
            shop_id: ctx.shop_id.or(defaults.shop_id),
            language_id: ctx.language_id.or(defaults.language_id),
            currency_id: ctx.currency_id.or(defaults.currency_id),
            employee_id: ctx.employee_id,
            languages: if ctx.languages.is_empty() {
                defaults.languages
            } else {
                ctx.languages
            },
            filters: ctx.filters,
        }
    }
}
