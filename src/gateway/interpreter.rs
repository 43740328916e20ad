//! Gateway response interpretation
//!
//! Collapses the gateway's failure shapes (non-structured bodies and
//! `request.result` envelopes flagging an error) into `GatewayError::ApiResponse`.
//! Bodies without an envelope pass through untouched.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::normalize::{normalize, Normalized};
use serde_json::Value;
use tracing::{debug, error};

/// Literal success marker some gateway endpoints use instead of `1`
const TRUE_MARKER: &str = "TRUE";

/// Return the payload on success or the gateway's failure as `ApiResponse`
pub fn interpret(raw: Value) -> GatewayResult<Value> {
    let map = match normalize(raw) {
        Normalized::Mapping(map) => map,
        Normalized::Sequence(items) => {
            debug!("Gateway returned a sequence body, passing through");
            return Ok(Value::Array(items));
        }
        Normalized::Scalar(value) => {
            let message = match render(&value) {
                text if text.is_empty() => "Empty response from gateway".to_string(),
                text => text,
            };
            error!("Gateway returned an unstructured response: {}", message);
            return Err(GatewayError::api_response(message, Some(value)));
        }
    };

    match map.get("request") {
        None | Some(Value::Null) => Ok(Value::Object(map)),
        Some(envelope) => {
            let result = envelope.get("result").unwrap_or(&Value::Null);
            if is_success(result) {
                return Ok(Value::Object(map));
            }

            let message = format!(
                "{} - {} {}",
                render(envelope.get("errorId").unwrap_or(&Value::Null)),
                render(envelope.get("errorMessage").unwrap_or(&Value::Null)),
                render(map.get("description").unwrap_or(&Value::Null)),
            );
            error!("Gateway request failed: {}", message);
            Err(GatewayError::api_response(message, Some(Value::Object(map))))
        }
    }
}

/// `result` counts as success when it is numerically one (`1`, `1.0`, `"1"`,
/// `true`) or exactly the string `"TRUE"`
fn is_success(result: &Value) -> bool {
    match result {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() == Some(1.0),
        Value::String(text) => {
            text == TRUE_MARKER || text.trim().parse::<f64>().map_or(false, |n| n == 1.0)
        }
        _ => false,
    }
}

/// String form used when composing error messages; absent values render empty
fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Number(number) => match number.as_f64() {
            Some(n) if number.is_f64() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", n as i64)
            }
            _ => number.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_of(err: GatewayError) -> String {
        match err {
            GatewayError::ApiResponse { message, .. } => message,
            other => panic!("expected ApiResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_success_passes_through() {
        let raw = json!({"request": {"result": 1}, "refundId": "RF-1"});
        assert_eq!(interpret(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_true_marker_is_success() {
        let raw = json!({"request": {"result": "TRUE"}});
        assert_eq!(interpret(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_loose_numeric_success() {
        for result in [json!("1"), json!(1.0), json!(true)] {
            let raw = json!({"request": {"result": result}});
            assert!(interpret(raw).is_ok());
        }
    }

    #[test]
    fn test_lowercase_true_is_failure() {
        let raw = json!({"request": {"result": "true", "errorId": "1", "errorMessage": "x"}});
        assert!(interpret(raw).is_err());
    }

    #[test]
    fn test_failure_message_keeps_trailing_space() {
        let raw = json!({"request": {"result": 0, "errorId": "42", "errorMessage": "Not found"}});
        let err = interpret(raw.clone()).unwrap_err();
        assert_eq!(err.raw_context(), Some(&raw));
        assert_eq!(message_of(err), "42 - Not found ");
    }

    #[test]
    fn test_failure_message_includes_description() {
        let raw = json!({
            "request": {"result": "0", "errorId": "PAY-404", "errorMessage": "Transaction not found"},
            "description": "Check the transaction id"
        });
        let err = interpret(raw).unwrap_err();
        assert_eq!(
            message_of(err),
            "PAY-404 - Transaction not found Check the transaction id"
        );
    }

    #[test]
    fn test_missing_result_is_failure() {
        let raw = json!({"request": {"errorId": 7, "errorMessage": "Denied"}});
        assert_eq!(message_of(interpret(raw).unwrap_err()), "7 - Denied ");
    }

    #[test]
    fn test_whole_float_error_id_renders_as_integer() {
        let raw = json!({"request": {"result": 0, "errorId": 42.0, "errorMessage": "Not found"}});
        assert_eq!(message_of(interpret(raw).unwrap_err()), "42 - Not found ");

        let raw = json!({"request": {"result": 0, "errorId": 4.5, "errorMessage": "x"}});
        assert_eq!(message_of(interpret(raw).unwrap_err()), "4.5 - x ");
    }

    #[test]
    fn test_flat_body_passes_through() {
        let raw = json!({"refundId": "RF-9", "amount": 500});
        assert_eq!(interpret(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_null_envelope_passes_through() {
        let raw = json!({"request": null, "refundId": "RF-9"});
        assert_eq!(interpret(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_scalar_bodies_are_errors() {
        let err = interpret(json!("Bad gateway")).unwrap_err();
        assert_eq!(err.raw_context(), Some(&json!("Bad gateway")));
        assert_eq!(message_of(err), "Bad gateway");

        assert!(interpret(json!(500)).is_err());

        let encoded = Value::String(r#"{"refundId":"RF-1"}"#.to_string());
        let err = interpret(encoded.clone()).unwrap_err();
        assert_eq!(err.raw_context(), Some(&encoded));
        assert_eq!(
            message_of(interpret(Value::Null).unwrap_err()),
            "Empty response from gateway"
        );
    }
}
