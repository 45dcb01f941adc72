use resource_framework::{FieldType, Operation, ResourceDescriptor};

/// Customization fields of a product.
///
/// The query returns an aggregate holding the list; it is unwrapped and every
/// element gets the product id from the URI, matching what single-item write
/// operations return.
pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("CustomizationField")
        .identifier("customizationFieldId")
        .field("customizationFieldId", FieldType::Int)
        .field("productId", FieldType::Int)
        .field("type", FieldType::Int)
        .field("names", FieldType::Localized)
        .field("required", FieldType::Bool)
        .field("addedByModule", FieldType::Bool)
        .operation(
            Operation::get(
                "customization_field_list",
                "/products/{productId}/customization-fields",
            )
            .requirement("productId", r"\d+")
            .scopes(["product_read"])
            .query("GetProductCustomizationFields")
            .result_mapping([
                ("localizedNames", "names"),
                ("isRequired", "required"),
                ("isAddedByModule", "addedByModule"),
            ])
            .unwrap_collection("customizationFields", Some(("productId", "productId"))),
        )
}
