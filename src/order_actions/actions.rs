//! The closed set of order actions and how requests decode into them.

use super::error::OrderActionError;
use crate::resources::order::{ORDER_STATUS_OPERATION, ORDER_TRACKING_OPERATION};
use resource_framework::{Normalizer, UriVariables};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A target status given either by id or by symbolic code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusRef {
    Id(u32),
    Code(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub order_id: u32,
    #[serde(default, alias = "statusId")]
    pub status: Option<StatusRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTrackingUpdate {
    pub order_id: u32,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
}

/// Actions on orders with no CQRS command behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    ChangeStatus(OrderStatusUpdate),
    UpdateTracking(OrderTrackingUpdate),
}

impl OrderAction {
    /// Decodes the action an operation stands for.
    ///
    /// Returns `Ok(None)` for operations that are not order actions, so the
    /// caller can reject them loudly. The order id always comes from the URI.
    pub fn decode(
        operation: &str,
        body: Map<String, Value>,
        uri_variables: &UriVariables,
    ) -> Result<Option<Self>, OrderActionError> {
        let mut payload = body;
        if let Some(order_id) = uri_variables.get("orderId") {
            payload.insert("orderId".to_string(), order_id.clone());
        }
        let payload = Value::Object(payload);

        let action = match operation {
            ORDER_STATUS_OPERATION => OrderAction::ChangeStatus(parse(payload)?),
            ORDER_TRACKING_OPERATION => OrderAction::UpdateTracking(parse(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(action))
    }

    pub fn order_id(&self) -> u32 {
        match self {
            OrderAction::ChangeStatus(update) => update.order_id,
            OrderAction::UpdateTracking(update) => update.order_id,
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T, OrderActionError> {
    Normalizer::to_typed(payload).map_err(|e| OrderActionError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uri(order_id: u32) -> UriVariables {
        json!({"orderId": order_id}).as_object().cloned().unwrap()
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_decode_status_by_id_and_code() {
        let action =
            OrderAction::decode(ORDER_STATUS_OPERATION, body(json!({"statusId": 4})), &uri(7))
                .unwrap()
                .unwrap();
        assert_eq!(
            action,
            OrderAction::ChangeStatus(OrderStatusUpdate {
                order_id: 7,
                status: Some(StatusRef::Id(4))
            })
        );

        let action = OrderAction::decode(
            ORDER_STATUS_OPERATION,
            body(json!({"status": "shipped"})),
            &uri(7),
        )
        .unwrap()
        .unwrap();
        assert!(matches!(
            action,
            OrderAction::ChangeStatus(OrderStatusUpdate {
                status: Some(StatusRef::Code(_)),
                ..
            })
        ));
    }

    #[test]
    fn test_uri_order_id_wins_over_body() {
        let action = OrderAction::decode(
            ORDER_TRACKING_OPERATION,
            body(json!({"orderId": 99, "trackingNumber": "1Z"})),
            &uri(7),
        )
        .unwrap()
        .unwrap();
        assert_eq!(action.order_id(), 7);
    }

    #[test]
    fn test_unknown_operation_decodes_to_none() {
        assert_eq!(OrderAction::decode("order_get", Map::new(), &uri(7)), Ok(None));
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        let err =
            OrderAction::decode(ORDER_STATUS_OPERATION, body(json!({"statusId": [1]})), &uri(7))
                .unwrap_err();
        assert!(matches!(err, OrderActionError::InvalidPayload(_)));
    }
}
