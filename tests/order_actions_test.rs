use resource_framework::mock::{MockCommandBus, MockQueryBus};
use resource_framework::{ApiRequest, RequestContext};
use serde_json::json;
use shop_api::grids::{InMemoryGrid, InMemoryModuleRepository};
use shop_api::order_actions::{InMemoryOrderStore, LegacyOrder, StatusHistoryEntry};
use shop_api::runtime::{ApiSettings, ApiSystem, Collaborators};
use std::sync::Arc;

const TRACKING_CARRIER: u32 = 2;
const PLAIN_CARRIER: u32 = 3;

fn store() -> Arc<InMemoryOrderStore> {
    Arc::new(
        InMemoryOrderStore::new()
            .with_status(1, "Awaiting payment")
            .with_status(2, "Payment accepted")
            .with_status(4, "Shipped")
            .with_tracking_carrier(TRACKING_CARRIER)
            .with_order(LegacyOrder::new(1, 2).with_carrier(TRACKING_CARRIER))
            .with_order(LegacyOrder::new(2, 2).with_carrier(PLAIN_CARRIER)),
    )
}

fn system(orders: Arc<InMemoryOrderStore>) -> ApiSystem {
    let collaborators = Collaborators {
        queries: MockQueryBus::new().shared(),
        commands: MockCommandBus::new().shared(),
        orders,
        api_client_grid: Arc::new(InMemoryGrid::new(vec![])),
        module_grid: Arc::new(InMemoryGrid::new(vec![])),
        modules: Arc::new(InMemoryModuleRepository::new()),
    };
    ApiSystem::new(ApiSettings::default(), collaborators).unwrap()
}

fn as_employee(request: ApiRequest) -> ApiRequest {
    request.with_context(RequestContext::new().with_employee(7))
}

#[tokio::test]
async fn test_status_change_records_history() {
    let orders = store();
    let system = system(orders.clone());

    let response = system
        .handle(as_employee(ApiRequest::put("/orders/1/status", json!({"statusId": 4}))))
        .await;

    assert_eq!(response.status, 204);
    assert_eq!(response.body, None);
    assert_eq!(orders.order(1).await.unwrap().current_status_id, 4);
    assert_eq!(
        orders.history().await,
        vec![StatusHistoryEntry {
            order_id: 1,
            status_id: 4,
            employee_id: Some(7),
        }]
    );
}

#[tokio::test]
async fn test_same_status_is_a_no_op() {
    let orders = store();
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put("/orders/1/status", json!({"statusId": 2})))
        .await;

    assert_eq!(response.status, 204);
    assert!(orders.history().await.is_empty());
}

#[tokio::test]
async fn test_unknown_status_is_rejected_without_mutation() {
    let orders = store();
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put("/orders/1/status", json!({"statusId": 99})))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(response.body.unwrap()["type"], "invalid_argument");
    assert_eq!(orders.order(1).await.unwrap().current_status_id, 2);
    assert!(orders.history().await.is_empty());
}

#[tokio::test]
async fn test_status_code_is_not_accepted() {
    let orders = store();
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put("/orders/1/status", json!({"statusId": "shipped"})))
        .await;

    assert_eq!(response.status, 400);
    assert!(orders.history().await.is_empty());
}

#[tokio::test]
async fn test_missing_status_is_rejected() {
    let system = system(store());

    let response = system.handle(ApiRequest::put("/orders/1/status", json!({}))).await;

    assert_eq!(response.status, 400);
}

#[tokio::test]
async fn test_missing_order_is_404() {
    let system = system(store());

    let response = system
        .handle(ApiRequest::put("/orders/50/status", json!({"statusId": 4})))
        .await;

    assert_eq!(response.status, 404);
    assert_eq!(response.body.unwrap()["type"], "not_found");
}

#[tokio::test]
async fn test_refused_write_is_a_server_error() {
    let orders = store();
    orders.refuse_writes().await;
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put("/orders/1/status", json!({"statusId": 4})))
        .await;

    assert_eq!(response.status, 500);
    assert_eq!(response.body.unwrap()["type"], "persistence");
    assert_eq!(orders.order(1).await.unwrap().current_status_id, 2);
}

#[tokio::test]
async fn test_failed_order_save_records_no_history() {
    let orders = store();
    orders.refuse_order_saves().await;
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put("/orders/1/status", json!({"statusId": 4})))
        .await;

    assert_eq!(response.status, 500);
    assert!(orders.history().await.is_empty());
    assert_eq!(orders.order(1).await.unwrap().current_status_id, 2);
}

#[tokio::test]
async fn test_tracking_url_kept_for_supporting_carrier() {
    let orders = store();
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put(
            "/orders/1/tracking",
            json!({"trackingNumber": " 1Z999 ", "trackingUrl": "https://track.example/1Z999"}),
        ))
        .await;

    assert_eq!(response.status, 204);
    let order = orders.order(1).await.unwrap();
    assert_eq!(order.tracking_number.as_deref(), Some("1Z999"));
    assert_eq!(order.tracking_url.as_deref(), Some("https://track.example/1Z999"));
}

#[tokio::test]
async fn test_tracking_url_ignored_for_other_carriers() {
    let orders = store();
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put(
            "/orders/2/tracking",
            json!({"trackingNumber": "AB123", "trackingUrl": "https://track.example/AB123"}),
        ))
        .await;

    assert_eq!(response.status, 204);
    let order = orders.order(2).await.unwrap();
    assert_eq!(order.tracking_number.as_deref(), Some("AB123"));
    assert_eq!(order.tracking_url, None);
}

#[tokio::test]
async fn test_blank_tracking_number_is_rejected_without_mutation() {
    let orders = store();
    let system = system(orders.clone());

    let response = system
        .handle(ApiRequest::put("/orders/1/tracking", json!({"trackingNumber": "   "})))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(orders.order(1).await.unwrap().tracking_number, None);
}
