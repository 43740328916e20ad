use crate::error::GatewayResult;
use crate::gateway::traits::{Dispatcher, GatewayOperation};
use crate::gateway::types::FieldMap;
use serde_json::Value;
use tracing::{debug, info};

/// Build, dispatch and interpret one operation
///
/// Validation happens before the dispatcher is touched, so a request that
/// fails to build never reaches the network. Transport errors are returned as
/// the dispatcher produced them.
pub async fn execute<O, D>(
    operation: &O,
    dispatcher: &D,
    endpoint: Option<&str>,
    version: Option<u32>,
) -> GatewayResult<O::Output>
where
    O: GatewayOperation + Sync,
    D: Dispatcher + ?Sized,
{
    let fields = merge_base_fields::<O, D>(operation.data()?, dispatcher);
    let endpoint = operation.resolve_endpoint(endpoint);
    let version = operation.resolve_version(version);

    info!(
        "Dispatching {} v{} with {} fields",
        endpoint,
        version,
        fields.len()
    );

    let raw = dispatcher
        .dispatch(endpoint, version, fields, O::REQUIRES_API_TOKEN)
        .await?;

    debug!("Interpreting response from {}", endpoint);
    operation.process_result(raw)
}

fn merge_base_fields<O, D>(mut fields: FieldMap, dispatcher: &D) -> FieldMap
where
    O: GatewayOperation,
    D: Dispatcher + ?Sized,
{
    if O::REQUIRES_SERVICE_ID && !fields.contains_key("serviceId") {
        if let Some(service_id) = dispatcher.service_id() {
            fields.insert("serviceId".to_string(), Value::String(service_id.to_string()));
        }
    }
    fields
}
