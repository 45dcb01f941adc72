//! Order actions with no CQRS command behind them yet.
//!
//! Status changes and tracking updates manipulate legacy order objects
//! through a [`LegacyOrderStore`], while keeping the same external contract
//! as command-backed operations: body in, side effect, no content out.

pub mod actions;
pub mod error;
pub mod processor;
pub mod store;

pub use actions::{OrderAction, OrderStatusUpdate, OrderTrackingUpdate, StatusRef};
pub use error::OrderActionError;
pub use processor::OrderActionProcessor;
pub use store::{InMemoryOrderStore, LegacyOrder, LegacyOrderStore, OrderStatus, StatusHistoryEntry};
