use super::actions::{OrderAction, OrderStatusUpdate, OrderTrackingUpdate, StatusRef};
use super::error::OrderActionError;
use super::store::{LegacyOrderStore, StatusHistoryEntry};
use async_trait::async_trait;
use resource_framework::resource::Operation;
use resource_framework::{ActionProcessor, ApiError, RequestContext, UriVariables};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Handles order status and tracking changes against the legacy store.
pub struct OrderActionProcessor {
    store: Arc<dyn LegacyOrderStore>,
}

impl OrderActionProcessor {
    pub fn new(store: Arc<dyn LegacyOrderStore>) -> Self {
        Self { store }
    }

    /// Runs one action. Every variant is handled; there is no fallthrough.
    pub async fn execute(
        &self,
        action: OrderAction,
        ctx: &RequestContext,
    ) -> Result<(), OrderActionError> {
        match action {
            OrderAction::ChangeStatus(update) => self.change_status(update, ctx).await,
            OrderAction::UpdateTracking(update) => self.update_tracking(update).await,
        }
    }

    #[instrument(skip(self, ctx), fields(order_id = update.order_id))]
    async fn change_status(
        &self,
        update: OrderStatusUpdate,
        ctx: &RequestContext,
    ) -> Result<(), OrderActionError> {
        let mut order = self
            .store
            .load_order(update.order_id)
            .await?
            .ok_or(OrderActionError::OrderNotFound(update.order_id))?;

        let status_id = match update.status {
            None => return Err(OrderActionError::MissingStatus),
            Some(StatusRef::Code(code)) => {
                return Err(OrderActionError::StatusCodeUnsupported(code))
            }
            Some(StatusRef::Id(id)) => id,
        };
        let status = self
            .store
            .load_status(status_id)
            .await?
            .ok_or(OrderActionError::UnknownStatus(status_id))?;

        if order.current_status_id == status.id {
            debug!(status_id = status.id, "Order already has this status");
            return Ok(());
        }

        let previous = order.clone();
        order.current_status_id = status.id;
        if !self.store.save_order(&order).await? {
            return Err(OrderActionError::PersistenceFailed {
                order_id: order.id,
                what: "order status",
            });
        }

        let entry = StatusHistoryEntry {
            order_id: order.id,
            status_id: status.id,
            employee_id: ctx.employee_id,
        };
        if !self.store.add_history(entry).await? {
            if !self.store.save_order(&previous).await? {
                error!(
                    status_id = previous.current_status_id,
                    "Could not restore order status after history failure"
                );
            }
            return Err(OrderActionError::PersistenceFailed {
                order_id: order.id,
                what: "status history",
            });
        }

        info!(status = %status.name, "Order status changed");
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = update.order_id))]
    async fn update_tracking(&self, update: OrderTrackingUpdate) -> Result<(), OrderActionError> {
        let mut order = self
            .store
            .load_order(update.order_id)
            .await?
            .ok_or(OrderActionError::OrderNotFound(update.order_id))?;

        let tracking_number = update
            .tracking_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(OrderActionError::MissingTrackingNumber)?;

        order.tracking_number = Some(tracking_number.to_string());
        if let (Some(carrier_id), Some(url)) = (order.carrier_id, update.tracking_url) {
            if self.store.carrier_supports_tracking_url(carrier_id).await? {
                order.tracking_url = Some(url);
            } else {
                debug!(carrier_id, "Carrier has no tracking URL, ignoring it");
            }
        }

        if !self.store.save_order(&order).await? {
            return Err(OrderActionError::PersistenceFailed {
                order_id: order.id,
                what: "tracking number",
            });
        }

        info!(tracking_number, "Order tracking updated");
        Ok(())
    }
}

#[async_trait]
impl ActionProcessor for OrderActionProcessor {
    async fn process(
        &self,
        operation: &Operation,
        body: Map<String, Value>,
        uri_variables: &UriVariables,
        ctx: &RequestContext,
    ) -> Result<Option<Value>, ApiError> {
        let action = OrderAction::decode(&operation.name, body, uri_variables)?.ok_or_else(|| {
            ApiError::Unsupported(format!(
                "operation `{}` is not an order action",
                operation.name
            ))
        })?;
        self.execute(action, ctx).await?;
        Ok(None)
    }
}
