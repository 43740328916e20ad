//! Transaction refund operation
//!
//! Refunds a completed transaction fully or partially. Parameters are collected
//! through setters that never fail; everything is validated once, when the
//! field map is built.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::execute::execute;
use crate::gateway::traits::{Dispatcher, GatewayOperation};
use crate::gateway::types::{percentage_value, FieldMap, MinorUnits, OmissionPolicy, ProductRefund};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

const PROCESS_DATE_FORMAT: &str = "%d-%m-%Y";

/// Refund request builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefundRequest {
    transaction_id: String,
    amount: Option<i64>,
    description: Option<String>,
    process_date: Option<NaiveDate>,
    vat_percentage: Option<f64>,
    currency: Option<String>,
    products: Option<Vec<ProductRefund>>,
    omission: OmissionPolicy,
}

impl RefundRequest {
    /// Create an empty refund request
    pub fn new() -> Self {
        Self::default()
    }

    /// Transaction to refund; required
    pub fn set_transaction_id(&mut self, transaction_id: impl Into<String>) -> &mut Self {
        self.transaction_id = transaction_id.into();
        self
    }

    /// Amount in minor currency units; without one the full amount is refunded
    pub fn set_amount<A: MinorUnits>(&mut self, amount: A) -> &mut Self {
        self.amount = Some(amount.into_minor_units());
        self
    }

    /// Description shown on the refund
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Date on which the refund should be processed
    pub fn set_process_date(&mut self, process_date: NaiveDate) -> &mut Self {
        self.process_date = Some(process_date);
        self
    }

    /// VAT percentage the refund applies to (AfterPay/Focum only)
    pub fn set_vat_percentage(&mut self, vat_percentage: f64) -> &mut Self {
        self.vat_percentage = Some(vat_percentage);
        self
    }

    /// Currency of `amount`; ignored by the gateway when no amount is sent
    pub fn set_currency(&mut self, currency: impl Into<String>) -> &mut Self {
        self.currency = Some(currency.into());
        self
    }

    /// `None` leaves products off the request; `Some(vec![])` sends an empty list
    pub fn set_products(&mut self, products: Option<Vec<ProductRefund>>) -> &mut Self {
        self.products = products;
        self
    }

    /// Choose how zero and empty values are serialized
    pub fn set_omission_policy(&mut self, policy: OmissionPolicy) -> &mut Self {
        self.omission = policy;
        self
    }

    /// Transaction id as currently set
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// Validate and emit the sparse field map
    pub fn build(&self) -> GatewayResult<FieldMap> {
        // "0" is as empty as "" for the gateway
        if self.transaction_id.is_empty() || self.transaction_id == "0" {
            return Err(GatewayError::required_field("transactionId"));
        }

        let policy = self.omission;
        let mut fields = FieldMap::new();
        fields.insert(
            "transactionId".to_string(),
            Value::String(self.transaction_id.clone()),
        );

        if let Some(amount) = self.amount.filter(|a| policy.keeps_int(*a)) {
            fields.insert("amount".to_string(), Value::from(amount));
        }
        if let Some(description) = self.description.as_deref().filter(|d| policy.keeps_str(d)) {
            fields.insert("description".to_string(), Value::from(description));
        }
        if let Some(date) = self.process_date {
            fields.insert(
                "processDate".to_string(),
                Value::String(date.format(PROCESS_DATE_FORMAT).to_string()),
            );
        }
        if let Some(vat) = self
            .vat_percentage
            .filter(|v| v.is_finite() && policy.keeps_float(*v))
        {
            fields.insert("vatPercentage".to_string(), percentage_value(vat));
        }
        if let Some(currency) = self.currency.as_deref().filter(|c| policy.keeps_str(c)) {
            fields.insert("currency".to_string(), Value::from(currency));
        }
        if let Some(products) = &self.products {
            fields.insert(
                "products".to_string(),
                Value::Array(products.iter().map(ProductRefund::to_value).collect()),
            );
        }

        Ok(fields)
    }

    /// Send the refund through `dispatcher`
    ///
    /// `endpoint` and `version` are accepted for parity with other operations
    /// but the refund is always sent to `transaction/refund` v15.
    pub async fn execute<D>(
        &self,
        dispatcher: &D,
        endpoint: Option<&str>,
        version: Option<u32>,
    ) -> GatewayResult<RefundResult>
    where
        D: Dispatcher + ?Sized,
    {
        info!("Requesting refund for transaction {}", self.transaction_id);
        let result = execute(self, dispatcher, endpoint, version).await?;
        info!(
            "Refund accepted for transaction {}: refund_id={}",
            self.transaction_id,
            result.refund_id().unwrap_or("-")
        );
        Ok(result)
    }
}

impl GatewayOperation for RefundRequest {
    type Output = RefundResult;

    const ENDPOINT: &'static str = "transaction/refund";
    const VERSION: u32 = 15;
    const REQUIRES_API_TOKEN: bool = true;

    fn data(&self) -> GatewayResult<FieldMap> {
        self.build()
    }

    fn to_output(&self, payload: Value) -> GatewayResult<RefundResult> {
        Ok(RefundResult { data: payload })
    }

    fn resolve_endpoint<'a>(&self, requested: Option<&'a str>) -> &'a str {
        if let Some(endpoint) = requested.filter(|e| *e != Self::ENDPOINT) {
            warn!(
                "Ignoring endpoint override {:?}, refunds always use {}",
                endpoint,
                Self::ENDPOINT
            );
        }
        Self::ENDPOINT
    }

    fn resolve_version(&self, requested: Option<u32>) -> u32 {
        if let Some(version) = requested.filter(|v| *v != Self::VERSION) {
            warn!(
                "Ignoring version override {}, refunds are pinned to v{}",
                version,
                Self::VERSION
            );
        }
        Self::VERSION
    }
}

/// Successful refund response, passed through as the gateway sent it
#[derive(Debug, Clone, PartialEq)]
pub struct RefundResult {
    data: Value,
}

impl RefundResult {
    /// Id the gateway assigned to the refund
    pub fn refund_id(&self) -> Option<&str> {
        self.data.get("refundId").and_then(Value::as_str)
    }

    /// Raw `request.result` marker, when the response carried an envelope
    pub fn request_result(&self) -> Option<&Value> {
        self.data.get("request").and_then(|request| request.get("result"))
    }

    /// Full response payload
    pub fn as_value(&self) -> &Value {
        &self.data
    }

    /// Consume the result, returning the response payload
    pub fn into_value(self) -> Value {
        self.data
    }
}

/// Refund `amount` (or the full amount when `None`) of `transaction_id`
pub async fn refund<D>(
    dispatcher: &D,
    transaction_id: &str,
    amount: Option<i64>,
) -> GatewayResult<RefundResult>
where
    D: Dispatcher + ?Sized,
{
    let mut request = RefundRequest::new();
    request.set_transaction_id(transaction_id);
    if let Some(amount) = amount {
        request.set_amount(amount);
    }
    request.execute(dispatcher, None, None).await
}
