//! Orders: read through the CQRS query, status and tracking changes through
//! the custom order action processor.

use super::ORDER_ACTIONS;
use resource_framework::{ErrorKind, FieldType, Operation, ResourceDescriptor};

pub const ORDER_STATUS_OPERATION: &str = "order_status_update";
pub const ORDER_TRACKING_OPERATION: &str = "order_tracking_update";

pub fn resource() -> ResourceDescriptor {
    ResourceDescriptor::new("Order")
        .identifier("orderId")
        .field("orderId", FieldType::Int)
        .field("reference", FieldType::String)
        .field("customerId", FieldType::Int)
        .field("statusId", FieldType::Int)
        .nullable_field("trackingNumber", FieldType::String)
        .field("totalPaidTaxIncluded", FieldType::String)
        .exception(ErrorKind::NotFound, 404)
        .exception(ErrorKind::InvalidArgument, 400)
        .exception(ErrorKind::Validation, 422)
        .operation(
            Operation::get("order_get", "/orders/{orderId}")
                .requirement("orderId", r"\d+")
                .scopes(["order_read"])
                .query("GetOrderForViewing")
                .result_mapping([
                    ("[id]", "orderId"),
                    ("[customer][id]", "customerId"),
                    ("[history][currentOrderStatusId]", "statusId"),
                    ("[shipping][trackingNumber]", "trackingNumber"),
                    ("[prices][totalAmountFormatted]", "totalPaidTaxIncluded"),
                ]),
        )
        .operation(
            Operation::put(ORDER_STATUS_OPERATION, "/orders/{orderId}/status")
                .requirement("orderId", r"\d+")
                .scopes(["order_write"])
                .custom_processor(ORDER_ACTIONS)
                .no_content(),
        )
        .operation(
            Operation::put(ORDER_TRACKING_OPERATION, "/orders/{orderId}/tracking")
                .requirement("orderId", r"\d+")
                .scopes(["order_write"])
                .custom_processor(ORDER_ACTIONS)
                .no_content(),
        )
}
