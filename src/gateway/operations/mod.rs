//! Gateway operations
//!
//! One module per remote operation, each implementing `GatewayOperation`.

pub mod refund;

pub use refund::{refund, RefundRequest, RefundResult};
