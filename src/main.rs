use resource_framework::{ApiRequest, ApiResponse, HttpMethod, RequestBody, RequestContext};
use serde_json::{json, Map};
use shop_api::demo::demo_collaborators;
use shop_api::runtime::{setup_tracing, ApiSettings, ApiSystem};
use tracing::{error, info, Instrument};

fn report(label: &str, response: &ApiResponse) {
    let body = response
        .body
        .as_ref()
        .map(|body| body.to_string())
        .unwrap_or_default();
    if response.is_success() {
        info!(status = response.status, %body, "{label}");
    } else {
        error!(status = response.status, %body, "{label}");
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let settings = match std::env::var("SHOP_API_SETTINGS") {
        Ok(path) => ApiSettings::load(&path).map_err(|e| e.to_string())?,
        Err(_) => ApiSettings::default(),
    };
    info!(?settings, "Starting shop API demo");

    let system = ApiSystem::new(settings, demo_collaborators()).map_err(|e| e.to_string())?;

    let response = system.handle(ApiRequest::get("/api-clients/1")).await;
    report("Read API client", &response);

    let span = tracing::info_span!("api_client_creation");
    let response = async {
        system
            .handle(ApiRequest::post(
                "/api-clients",
                json!({
                    "clientId": "warehouse",
                    "clientName": "Warehouse robot",
                    "enabled": true,
                    "description": null,
                    "scopes": ["order_read"],
                    "lifetime": 600
                }),
            ))
            .await
    }
    .instrument(span)
    .await;
    report("Created API client", &response);

    let request = ApiRequest::get("/api-clients").with_context(
        RequestContext::new()
            .with_filter("limit", json!(10))
            .with_filter("orderBy", json!("clientName"))
            .with_filter("sortOrder", json!("desc")),
    );
    report("Listed API clients", &system.handle(request).await);

    let response = system
        .handle(ApiRequest::patch("/cart/3/products", json!({"productId": 20, "quantity": 2})))
        .await;
    report("Updated cart", &response);

    let response = system
        .handle(ApiRequest::get("/products/5").with_context(RequestContext::new().with_language(2)))
        .await;
    report("Read product", &response);

    let mut form = Map::new();
    form.insert("image".into(), json!("/tmp/upload/mug.jpg"));
    let response = system
        .handle(
            ApiRequest::new(HttpMethod::Post, "/products/5/images")
                .with_body(RequestBody::Form(form)),
        )
        .await;
    report("Uploaded product image", &response);

    let response = system
        .handle(ApiRequest::get("/products/5/customization-fields"))
        .await;
    report("Listed customization fields", &response);

    let response = system.handle(ApiRequest::get("/modules")).await;
    report("Listed modules", &response);

    let employee = RequestContext::new().with_employee(7);
    let response = system
        .handle(
            ApiRequest::put("/orders/1/status", json!({"statusId": 4}))
                .with_context(employee.clone()),
        )
        .await;
    report("Changed order status", &response);

    let response = system
        .handle(
            ApiRequest::put(
                "/orders/1/tracking",
                json!({
                    "trackingNumber": "1Z999AA10123456784",
                    "trackingUrl": "https://track.example/1Z999"
                }),
            )
            .with_context(employee),
        )
        .await;
    report("Updated order tracking", &response);

    let response = system.handle(ApiRequest::get("/orders/1")).await;
    report("Read order", &response);

    let response = system.handle(ApiRequest::get("/orders/99")).await;
    report("Read missing order", &response);

    info!("Demo completed");
    Ok(())
}
