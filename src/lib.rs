//! Pay.nl refund client
//!
//! Typed request building and response interpretation for the gateway's
//! `transaction/refund` operation, plus an HTTP dispatcher to send it.

pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult, TransportError};
pub use gateway::operations::{refund, RefundRequest, RefundResult};
pub use gateway::{Dispatcher, GatewayOperation, OmissionPolicy, ProductRefund};

#[cfg(feature = "dispatcher")]
pub use gateway::ReqwestDispatcher;
