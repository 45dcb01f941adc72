use resource_framework::resource::ResourceDescriptor;
use resource_framework::{
    ApiKernel, ApiRequest, BusError, ErrorKind, FieldType, HandlerBus, Language, LanguageCatalog,
    Operation, RequestContext, ResourceRegistry,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

// --- Test Resources ---

fn product_resource() -> ResourceDescriptor {
    ResourceDescriptor::new("Product")
        .identifier("productId")
        .field("productId", FieldType::Int)
        .field("names", FieldType::Localized)
        .nullable_field("priceTaxExcluded", FieldType::String)
        .exception(ErrorKind::NotFound, 404)
        .exception(ErrorKind::Validation, 422)
        .operation(
            Operation::get("product_get", "/products/{productId}")
                .requirement("productId", r"\d+")
                .query("GetProductForEditing")
                .result_mapping([
                    ("[basicInformation][localizedNames]", "names"),
                    ("[pricesInformation][price]", "priceTaxExcluded"),
                ]),
        )
        .operation(
            Operation::patch("product_update", "/products/{productId}")
                .requirement("productId", r"\d+")
                .command("UpdateProductCommand")
                .query("GetProductForEditing")
                .command_mapping([("names", "localizedNames")])
                .result_mapping([
                    ("[basicInformation][localizedNames]", "names"),
                    ("[pricesInformation][price]", "priceTaxExcluded"),
                ]),
        )
}

fn context() -> RequestContext {
    RequestContext::new()
        .with_shop(1)
        .with_language(1)
        .with_languages(LanguageCatalog::new(vec![
            Language { id: 1, locale: "en-US".into() },
            Language { id: 2, locale: "fr-FR".into() },
        ]))
}

fn product_row(id: u64) -> Value {
    json!({
        "productId": id,
        "basicInformation": {"localizedNames": {"1": "Mug", "2": "Tasse"}},
        "pricesInformation": {"price": "9.90"}
    })
}

/// Full pipeline with an in-process bus: route, query, renames, localization.
#[tokio::test]
async fn test_full_read_pipeline_with_handler_bus() {
    let bus = Arc::new(HandlerBus::new().handle("GetProductForEditing", |payload| {
        match payload["productId"].as_u64() {
            Some(3) => Ok(Some(product_row(3))),
            _ => Err(BusError::not_found("Product not found")),
        }
    }));
    let registry = Arc::new(ResourceRegistry::new(vec![product_resource()]).unwrap());
    let kernel = ApiKernel::new(registry, bus.clone(), bus);

    let response = kernel
        .handle(ApiRequest::get("/products/3").with_context(context()))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(
        response.body,
        Some(json!({
            "productId": 3,
            "names": {"en-US": "Mug", "fr-FR": "Tasse"},
            "priceTaxExcluded": "9.90"
        }))
    );

    let response = kernel
        .handle(ApiRequest::get("/products/4").with_context(context()))
        .await;
    assert_eq!(response.status, 404);
}

/// Write then re-read: locales become language ids on the way in.
#[tokio::test]
async fn test_update_converts_locales_and_rereads() {
    let seen = Arc::new(Mutex::new(None));
    let recorder = seen.clone();
    let bus = Arc::new(
        HandlerBus::new()
            .handle("UpdateProductCommand", move |payload| {
                *recorder.lock().unwrap() = Some(payload);
                Ok(None)
            })
            .handle("GetProductForEditing", |_| Ok(Some(product_row(3)))),
    );
    let registry = Arc::new(ResourceRegistry::new(vec![product_resource()]).unwrap());
    let kernel = ApiKernel::new(registry, bus.clone(), bus);

    let response = kernel
        .handle(
            ApiRequest::patch("/products/3", json!({"names": {"fr-FR": "Tasse"}}))
                .with_context(context()),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.body.unwrap()["productId"], 3);
    let payload = seen.lock().unwrap().clone().unwrap();
    assert_eq!(payload["localizedNames"], json!({"2": "Tasse"}));
    assert_eq!(payload["productId"], 3);
    assert_eq!(payload["shopId"], 1);
}

#[tokio::test]
async fn test_unknown_locale_is_unprocessable() {
    let bus = Arc::new(HandlerBus::new());
    let registry = Arc::new(ResourceRegistry::new(vec![product_resource()]).unwrap());
    let kernel = ApiKernel::new(registry, bus.clone(), bus);

    let response = kernel
        .handle(
            ApiRequest::patch("/products/3", json!({"names": {"de-DE": "Becher"}}))
                .with_context(context()),
        )
        .await;
    assert_eq!(response.status, 422);
}

#[tokio::test]
async fn test_missing_handler_is_server_error() {
    let bus = Arc::new(HandlerBus::new());
    let registry = Arc::new(ResourceRegistry::new(vec![product_resource()]).unwrap());
    let kernel = ApiKernel::new(registry, bus.clone(), bus);

    let response = kernel.handle(ApiRequest::get("/products/3")).await;
    assert_eq!(response.status, 500);
    assert_eq!(response.body.unwrap()["type"], "configuration");
}
