//! In-memory collaborators standing in for the shop's domain layer.
//!
//! Used by the demo binary and by end-to-end tests. The handlers behave like
//! the real CQRS handlers as far as shapes go: snake_case legacy names for
//! API clients, nested aggregates for orders and products.

use crate::grids::{InMemoryGrid, InMemoryModuleRepository};
use crate::order_actions::{InMemoryOrderStore, LegacyOrder};
use crate::runtime::Collaborators;
use resource_framework::{BusError, ErrorKind, HandlerBus};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type ApiClients = Arc<Mutex<BTreeMap<u64, Value>>>;

fn api_client_row(id: u64, client_id: &str, name: &str, description: Option<&str>) -> Value {
    json!({
        "id_api_client": id,
        "client_id": client_id,
        "client_name": name,
        "enabled": true,
        "description": description,
        "external_issuer": null,
        "scopes": ["product_read"],
        "lifetime": 3600
    })
}

fn id_from(payload: &Value, field: &str) -> Result<u64, BusError> {
    payload[field].as_u64().ok_or_else(|| BusError::Domain {
        kind: ErrorKind::InvalidArgument,
        message: format!("`{field}` must be a positive integer"),
    })
}

fn with_clients<T>(
    clients: &ApiClients,
    f: impl FnOnce(&mut BTreeMap<u64, Value>) -> Result<T, BusError>,
) -> Result<T, BusError> {
    let mut guard = clients
        .lock()
        .map_err(|_| BusError::Unavailable("api client store poisoned".into()))?;
    f(&mut guard)
}

/// Copies the writable legacy fields of a command payload onto a row.
fn apply_fields(row: &mut Map<String, Value>, payload: &Value) {
    let writable = [
        "client_id",
        "client_name",
        "enabled",
        "description",
        "external_issuer",
        "scopes",
        "lifetime",
    ];
    for field in writable {
        if let Some(value) = payload.get(field) {
            row.insert(field.to_string(), value.clone());
        }
    }
}

/// A bus answering every query and command the shop resources bind.
pub fn demo_bus() -> HandlerBus {
    let clients: ApiClients = Arc::new(Mutex::new(BTreeMap::from([
        (1, api_client_row(1, "erp-connector", "ERP connector", Some("Stock sync"))),
        (2, api_client_row(2, "mailer", "Newsletter", None)),
    ])));

    let read = clients.clone();
    let add = clients.clone();
    let edit = clients.clone();
    let delete = clients;

    HandlerBus::new()
        .handle("GetApiClientForEditing", move |payload| {
            let id = id_from(&payload, "apiClientId")?;
            with_clients(&read, |rows| {
                rows.get(&id)
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| BusError::not_found(format!("Api client {id} not found")))
            })
        })
        .handle("AddApiClientCommand", move |payload| {
            with_clients(&add, |rows| {
                let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
                let mut row = Map::new();
                row.insert("id_api_client".into(), json!(id));
                apply_fields(&mut row, &payload);
                rows.insert(id, Value::Object(row));
                Ok(Some(json!({"id": id})))
            })
        })
        .handle("EditApiClientCommand", move |payload| {
            let id = id_from(&payload, "id_api_client")?;
            with_clients(&edit, |rows| match rows.get_mut(&id) {
                Some(Value::Object(row)) => {
                    apply_fields(row, &payload);
                    Ok(None)
                }
                _ => Err(BusError::not_found(format!("Api client {id} not found"))),
            })
        })
        .handle("DeleteApiClientCommand", move |payload| {
            let id = id_from(&payload, "id_api_client")?;
            with_clients(&delete, |rows| match rows.remove(&id) {
                Some(_) => Ok(None),
                None => Err(BusError::not_found(format!("Api client {id} not found"))),
            })
        })
        .handle("UpdateProductQuantityInCartCommand", |payload| {
            id_from(&payload, "cartId")?;
            id_from(&payload, "productId")?;
            match payload["quantity"].as_i64() {
                Some(quantity) if quantity > 0 => Ok(None),
                _ => Err(BusError::constraint("Quantity must be strictly positive")),
            }
        })
        .handle("GetOrderForViewing", |payload| {
            let id = id_from(&payload, "orderId")?;
            if id != 1 {
                return Err(BusError::not_found(format!("Order {id} not found")));
            }
            Ok(Some(json!({
                "id": 1,
                "reference": "XKBKNABJK",
                "customer": {"id": 2, "email": "pub@example.com"},
                "history": {"currentOrderStatusId": 2},
                "shipping": {"trackingNumber": null},
                "prices": {"totalAmountFormatted": "$61.80"}
            })))
        })
        .handle("GetProductForEditing", |payload| {
            let id = id_from(&payload, "productId")?;
            if id != 5 {
                return Err(BusError::not_found(format!("Product {id} not found")));
            }
            Ok(Some(json!({
                "type": "standard",
                "active": true,
                "basicInformation": {
                    "localizedNames": {
                        "1": "Mug The best is yet to come",
                        "2": "Mug Le meilleur reste à venir"
                    },
                    "localizedDescriptions": {"1": "Ceramic mug", "2": "Mug en céramique"}
                },
                "pricesInformation": {"price": "11.90"}
            })))
        })
        .handle("AddProductImageCommand", |payload| {
            id_from(&payload, "productId")?;
            if payload["filePath"].as_str().map_or(true, str::is_empty) {
                return Err(BusError::Domain {
                    kind: ErrorKind::Validation,
                    message: "An image file is required".into(),
                });
            }
            Ok(Some(json!({"id": 42})))
        })
        .handle("GetProductImage", |payload| {
            let image_id = id_from(&payload, "imageId")?;
            Ok(Some(json!({"id": image_id, "isCover": false, "position": 2})))
        })
        .handle("GetProductCustomizationFields", |payload| {
            id_from(&payload, "productId")?;
            Ok(Some(json!({
                "customizationFields": [
                    {
                        "customizationFieldId": 3,
                        "type": 1,
                        "localizedNames": {"1": "Engraving"},
                        "isRequired": false,
                        "isAddedByModule": false
                    }
                ]
            })))
        })
}

pub fn demo_api_client_grid() -> InMemoryGrid {
    InMemoryGrid::new(vec![
        api_client_row(1, "erp-connector", "ERP connector", Some("Stock sync")),
        api_client_row(2, "mailer", "Newsletter", None),
    ])
}

pub fn demo_module_grid() -> InMemoryGrid {
    InMemoryGrid::new(vec![
        json!({"id_module": 1, "name": "ps_banner", "version": "2.1.2", "active": true}),
        json!({
            "id_module": 2,
            "name": "ps_emailsubscription",
            "version": "2.8.0",
            "active": false
        }),
    ])
}

pub fn demo_order_store() -> InMemoryOrderStore {
    InMemoryOrderStore::new()
        .with_status(1, "Awaiting payment")
        .with_status(2, "Payment accepted")
        .with_status(3, "Processing in progress")
        .with_status(4, "Shipped")
        .with_tracking_carrier(2)
        .with_order(LegacyOrder::new(1, 2).with_carrier(2))
}

pub fn demo_collaborators() -> Collaborators {
    let bus = Arc::new(demo_bus());
    Collaborators {
        queries: bus.clone(),
        commands: bus,
        orders: Arc::new(demo_order_store()),
        api_client_grid: Arc::new(demo_api_client_grid()),
        module_grid: Arc::new(demo_module_grid()),
        modules: Arc::new(InMemoryModuleRepository::new().with_installed("ps_banner", "2.1.0")),
    }
}
