//! Gateway trait definitions
//!
//! `Dispatcher` is the seam to the network; `GatewayOperation` is implemented
//! once per remote operation and carries its protocol envelope.

use crate::error::{GatewayResult, TransportError};
use crate::gateway::interpreter::interpret;
use crate::gateway::types::FieldMap;
use async_trait::async_trait;
use serde_json::Value;

/// Performs the actual network call for an operation
///
/// Implementations own authentication, retries, timeouts and decoding. The
/// returned value is the decoded response body, whatever its shape.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        endpoint: &str,
        version: u32,
        fields: FieldMap,
        requires_api_token: bool,
    ) -> Result<Value, TransportError>;

    /// Service id contributed to operations that require one
    fn service_id(&self) -> Option<&str> {
        None
    }
}

/// One remote gateway operation
pub trait GatewayOperation {
    type Output;

    const ENDPOINT: &'static str;
    const VERSION: u32;
    const REQUIRES_API_TOKEN: bool;
    const REQUIRES_SERVICE_ID: bool = false;

    /// Validate accumulated parameters and emit the sparse field map
    fn data(&self) -> GatewayResult<FieldMap>;

    /// Turn a successfully interpreted payload into the operation's output
    fn to_output(&self, payload: Value) -> GatewayResult<Self::Output>;

    fn process_result(&self, raw: Value) -> GatewayResult<Self::Output> {
        let payload = interpret(raw)?;
        self.to_output(payload)
    }

    fn resolve_endpoint<'a>(&self, requested: Option<&'a str>) -> &'a str {
        requested.unwrap_or(Self::ENDPOINT)
    }

    fn resolve_version(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(Self::VERSION)
    }
}
