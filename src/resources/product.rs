use resource_framework::{ErrorKind, FieldType, Operation, ResourceDescriptor};

/// A catalog product with localized names and descriptions.
pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("Product")
        .identifier("productId")
        .field("productId", FieldType::Int)
        .field("type", FieldType::String)
        .field("active", FieldType::Bool)
        .field("names", FieldType::Localized)
        .nullable_field("descriptions", FieldType::Localized)
        .nullable_field("priceTaxExcluded", FieldType::String)
        .exception(ErrorKind::NotFound, 404)
        .operation(
            Operation::get("product_get", "/products/{productId}")
                .requirement("productId", r"\d+")
                .scopes(["product_read"])
                .query("GetProductForEditing")
                .result_mapping([
                    ("[type]", "type"),
                    ("[active]", "active"),
                    ("[basicInformation][localizedNames]", "names"),
                    ("[basicInformation][localizedDescriptions]", "descriptions"),
                    ("[pricesInformation][price]", "priceTaxExcluded"),
                ])
                .uri_variables_in_result(),
        )
}

/// An image uploaded for a product as `multipart/form-data`.
pub fn image_resource() -> ResourceDescriptor {
    ResourceDescriptor::new("ProductImage")
        .identifier("imageId")
        .field("imageId", FieldType::Int)
        .field("productId", FieldType::Int)
        .field("image", FieldType::File)
        .field("cover", FieldType::Bool)
        .nullable_field("position", FieldType::Int)
        .exception(ErrorKind::NotFound, 404)
        .exception(ErrorKind::Validation, 422)
        .exception(ErrorKind::Unsupported, 415)
        .operation(
            Operation::post("product_image_add", "/products/{productId}/images")
                .requirement("productId", r"\d+")
                .scopes(["product_write"])
                .multipart(false)
                .command("AddProductImageCommand")
                .command_mapping([("image", "filePath")])
                .query("GetProductImage")
                .result_mapping([("[id]", "imageId"), ("[isCover]", "cover")]),
        )
}
