use resource_framework::{ErrorKind, FieldType, Operation, ResourceDescriptor};

/// A product line of a cart. Field names already match the command, so
/// there is no rename table.
pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("CartProduct")
        .field("cartId", FieldType::Int)
        .field("productId", FieldType::Int)
        .nullable_field("combinationId", FieldType::Int)
        .nullable_field("customizationId", FieldType::Int)
        .field("quantity", FieldType::Int)
        .exception(ErrorKind::NotFound, 404)
        .exception(ErrorKind::Validation, 422)
        .exception(ErrorKind::Constraint, 422)
        .operation(
            Operation::patch("cart_product_update", "/cart/{cartId}/products")
                .requirement("cartId", r"\d+")
                .scopes(["cart_write"])
                .command("UpdateProductQuantityInCartCommand"),
        )
}
