//! End-to-end refund flow against an in-memory dispatcher

use async_trait::async_trait;
use chrono::NaiveDate;
use paynl_refund::gateway::FieldMap;
use paynl_refund::{
    refund, Dispatcher, GatewayError, ProductRefund, RefundRequest, TransportError,
};
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone)]
struct Call {
    endpoint: String,
    version: u32,
    fields: FieldMap,
    requires_api_token: bool,
}

struct RecordingDispatcher {
    response: Mutex<Option<Result<Value, TransportError>>>,
    calls: Mutex<Vec<Call>>,
    service_id: Option<String>,
}

impl RecordingDispatcher {
    fn responding(response: Value) -> Self {
        Self::with_result(Ok(response))
    }

    fn with_result(result: Result<Value, TransportError>) -> Self {
        Self {
            response: Mutex::new(Some(result)),
            calls: Mutex::new(Vec::new()),
            service_id: Some("SL-1234-5678".to_string()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        endpoint: &str,
        version: u32,
        fields: FieldMap,
        requires_api_token: bool,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(Call {
            endpoint: endpoint.to_string(),
            version,
            fields,
            requires_api_token,
        });
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(TransportError::network("no response queued")))
    }

    fn service_id(&self) -> Option<&str> {
        self.service_id.as_deref()
    }
}

fn sample_request() -> RefundRequest {
    let mut request = RefundRequest::new();
    request
        .set_transaction_id("1234567890X12345")
        .set_amount(500)
        .set_description("refund")
        .set_process_date(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
    request
}

#[tokio::test]
async fn test_successful_refund() {
    let body = json!({"request": {"result": "1", "errorId": "", "errorMessage": ""}, "refundId": "RF-1"});
    let dispatcher = RecordingDispatcher::responding(body.clone());

    let result = sample_request().execute(&dispatcher, None, None).await.unwrap();
    assert_eq!(result.refund_id(), Some("RF-1"));
    assert_eq!(result.as_value(), &body);

    let calls = dispatcher.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, "transaction/refund");
    assert_eq!(calls[0].version, 15);
    assert!(calls[0].requires_api_token);
    assert_eq!(
        Value::Object(calls[0].fields.clone()),
        json!({
            "transactionId": "1234567890X12345",
            "amount": 500,
            "description": "refund",
            "processDate": "07-03-2024"
        })
    );
}

#[tokio::test]
async fn test_missing_transaction_id_never_dispatches() {
    let dispatcher = RecordingDispatcher::responding(json!({"request": {"result": 1}}));
    let mut request = RefundRequest::new();
    request.set_amount(100);

    let err = request.execute(&dispatcher, None, None).await.unwrap_err();
    match err {
        GatewayError::RequiredField { field, .. } => assert_eq!(field, "transactionId"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(dispatcher.calls().is_empty());
}

#[tokio::test]
async fn test_overrides_are_ignored() {
    let dispatcher = RecordingDispatcher::responding(json!({"request": {"result": 1}}));

    sample_request()
        .execute(&dispatcher, Some("transaction/info"), Some(5))
        .await
        .unwrap();

    let calls = dispatcher.calls();
    assert_eq!(calls[0].endpoint, "transaction/refund");
    assert_eq!(calls[0].version, 15);
}

#[tokio::test]
async fn test_refund_does_not_add_service_id() {
    let dispatcher = RecordingDispatcher::responding(json!({"request": {"result": 1}}));
    sample_request().execute(&dispatcher, None, None).await.unwrap();
    assert!(!dispatcher.calls()[0].fields.contains_key("serviceId"));
}

#[tokio::test]
async fn test_gateway_failure_is_api_response_error() {
    let dispatcher = RecordingDispatcher::responding(json!({
        "request": {"result": 0, "errorId": "42", "errorMessage": "Not found"}
    }));

    let err = sample_request()
        .execute(&dispatcher, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::ApiResponse { .. }));
    assert_eq!(err.to_string(), "42 - Not found ");
}

#[tokio::test]
async fn test_unstructured_response_is_error() {
    let dispatcher = RecordingDispatcher::responding(json!("Internal error"));
    let err = sample_request()
        .execute(&dispatcher, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.raw_context(), Some(&json!("Internal error")));
}

#[tokio::test]
async fn test_transport_error_passes_through() {
    let dispatcher = RecordingDispatcher::with_result(Err(TransportError::Timeout {
        endpoint: "/v15/Transaction/refund/json".to_string(),
    }));

    let err = sample_request()
        .execute(&dispatcher, None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::Transport(TransportError::Timeout { .. })
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_products_are_forwarded_in_order() {
    let dispatcher = RecordingDispatcher::responding(json!({"refundId": "RF-2"}));
    let mut request = sample_request();
    request.set_products(Some(vec![
        ProductRefund::new("SKU-2", 1),
        ProductRefund::new("SKU-1", 3),
    ]));

    let result = request.execute(&dispatcher, None, None).await.unwrap();
    assert_eq!(result.refund_id(), Some("RF-2"));
    assert!(result.request_result().is_none());
    assert_eq!(
        dispatcher.calls()[0].fields.get("products"),
        Some(&json!([
            {"productId": "SKU-2", "quantity": 1},
            {"productId": "SKU-1", "quantity": 3}
        ]))
    );
}

#[tokio::test]
async fn test_refund_helper() {
    let dispatcher = RecordingDispatcher::responding(json!({"request": {"result": "TRUE"}}));
    refund(&dispatcher, "T1", None).await.unwrap();

    assert_eq!(
        Value::Object(dispatcher.calls()[0].fields.clone()),
        json!({"transactionId": "T1"})
    );
}
