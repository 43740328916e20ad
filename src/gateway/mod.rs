//! Gateway request/response layer
//!
//! Operations build sparse field maps, a `Dispatcher` carries them to the
//! gateway, and the interpreter turns whatever comes back into a typed result
//! or a `GatewayError`.

#[cfg(feature = "dispatcher")]
pub mod dispatcher;
pub mod execute;
pub mod interpreter;
pub mod normalize;
pub mod operations;
pub mod traits;
pub mod types;

#[cfg(feature = "dispatcher")]
pub use dispatcher::ReqwestDispatcher;
pub use execute::execute;
pub use interpreter::interpret;
pub use traits::{Dispatcher, GatewayOperation};
pub use types::{FieldMap, OmissionPolicy, ProductRefund};
