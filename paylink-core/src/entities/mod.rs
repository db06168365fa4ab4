pub mod order_records;

pub use order_records::{NewOrder, OrderRecord, OrderStatus};
