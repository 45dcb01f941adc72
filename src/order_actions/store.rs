//! The legacy order objects the action processor manipulates directly.

use super::error::OrderActionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyOrder {
    pub id: u32,
    pub current_status_id: u32,
    pub carrier_id: Option<u32>,
    pub tracking_number: Option<String>,
    pub tracking_url: Option<String>,
}

impl LegacyOrder {
    pub fn new(id: u32, current_status_id: u32) -> Self {
        Self {
            id,
            current_status_id,
            carrier_id: None,
            tracking_number: None,
            tracking_url: None,
        }
    }

    pub fn with_carrier(mut self, carrier_id: u32) -> Self {
        self.carrier_id = Some(carrier_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub id: u32,
    pub name: String,
}

/// One status transition recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub order_id: u32,
    pub status_id: u32,
    pub employee_id: Option<u32>,
}

/// Direct access to legacy order persistence.
///
/// Writes report success as a `bool` the way the legacy layer does; `Err` is
/// reserved for the store itself being unusable.
#[async_trait]
pub trait LegacyOrderStore: Send + Sync {
    async fn load_order(&self, order_id: u32) -> Result<Option<LegacyOrder>, OrderActionError>;

    async fn load_status(&self, status_id: u32) -> Result<Option<OrderStatus>, OrderActionError>;

    async fn add_history(&self, entry: StatusHistoryEntry) -> Result<bool, OrderActionError>;

    async fn save_order(&self, order: &LegacyOrder) -> Result<bool, OrderActionError>;

    async fn carrier_supports_tracking_url(&self, carrier_id: u32)
        -> Result<bool, OrderActionError>;
}

#[derive(Debug, Default)]
struct StoreState {
    orders: HashMap<u32, LegacyOrder>,
    statuses: HashMap<u32, OrderStatus>,
    history: Vec<StatusHistoryEntry>,
    tracking_carriers: Vec<u32>,
    refuse_order_saves: bool,
    refuse_history: bool,
}

/// In-memory [`LegacyOrderStore`] for the demo and tests.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    state: Mutex<StoreState>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: LegacyOrder) -> Self {
        self.state.get_mut().orders.insert(order.id, order);
        self
    }

    pub fn with_status(mut self, id: u32, name: &str) -> Self {
        self.state.get_mut().statuses.insert(
            id,
            OrderStatus {
                id,
                name: name.to_string(),
            },
        );
        self
    }

    /// Marks `carrier_id` as one whose tracking URL can be stored.
    pub fn with_tracking_carrier(mut self, carrier_id: u32) -> Self {
        self.state.get_mut().tracking_carriers.push(carrier_id);
        self
    }

    /// Makes every subsequent write report failure.
    pub async fn refuse_writes(&self) {
        let mut state = self.state.lock().await;
        state.refuse_order_saves = true;
        state.refuse_history = true;
    }

    /// Makes order saves report failure while history writes still succeed.
    pub async fn refuse_order_saves(&self) {
        self.state.lock().await.refuse_order_saves = true;
    }

    /// Makes history writes report failure while order saves still succeed.
    pub async fn refuse_history(&self) {
        self.state.lock().await.refuse_history = true;
    }

    pub async fn order(&self, order_id: u32) -> Option<LegacyOrder> {
        self.state.lock().await.orders.get(&order_id).cloned()
    }

    pub async fn history(&self) -> Vec<StatusHistoryEntry> {
        self.state.lock().await.history.clone()
    }
}

#[async_trait]
impl LegacyOrderStore for InMemoryOrderStore {
    async fn load_order(&self, order_id: u32) -> Result<Option<LegacyOrder>, OrderActionError> {
        Ok(self.state.lock().await.orders.get(&order_id).cloned())
    }

    async fn load_status(&self, status_id: u32) -> Result<Option<OrderStatus>, OrderActionError> {
        Ok(self.state.lock().await.statuses.get(&status_id).cloned())
    }

    async fn add_history(&self, entry: StatusHistoryEntry) -> Result<bool, OrderActionError> {
        let mut state = self.state.lock().await;
        if state.refuse_history {
            return Ok(false);
        }
        state.history.push(entry);
        Ok(true)
    }

    async fn save_order(&self, order: &LegacyOrder) -> Result<bool, OrderActionError> {
        let mut state = self.state.lock().await;
        if state.refuse_order_saves {
            return Ok(false);
        }
        state.orders.insert(order.id, order.clone());
        Ok(true)
    }

    async fn carrier_supports_tracking_url(
        &self,
        carrier_id: u32,
    ) -> Result<bool, OrderActionError> {
        Ok(self.state.lock().await.tracking_carriers.contains(&carrier_id))
    }
}
