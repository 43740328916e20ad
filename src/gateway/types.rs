//! Wire types shared by gateway operations

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Sparse key/value payload handed to the dispatcher
pub type FieldMap = Map<String, Value>;

/// How optional scalar fields holding a zero or empty value are serialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OmissionPolicy {
    /// Zero amounts, zero VAT and empty strings are dropped, matching what the
    /// gateway has always received. A refund of `0` is therefore sent as a
    /// refund without an amount.
    #[default]
    GatewayCompatible,
    /// Every explicitly set value is sent, including `0` and `""`
    ExplicitValues,
}

impl OmissionPolicy {
    pub(crate) fn keeps_int(self, value: i64) -> bool {
        match self {
            Self::GatewayCompatible => value != 0,
            Self::ExplicitValues => true,
        }
    }

    pub(crate) fn keeps_float(self, value: f64) -> bool {
        match self {
            Self::GatewayCompatible => value != 0.0,
            Self::ExplicitValues => true,
        }
    }

    pub(crate) fn keeps_str(self, value: &str) -> bool {
        match self {
            // "0" counts as empty too
            Self::GatewayCompatible => !value.is_empty() && value != "0",
            Self::ExplicitValues => true,
        }
    }
}

/// A product line to refund
///
/// Only `productId` and `quantity` are named here; any other attribute the
/// gateway accepts travels in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRefund {
    pub product_id: String,
    pub quantity: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductRefund {
    /// Refund `quantity` units of `product_id`
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            extra: Map::new(),
        }
    }

    /// Attach an extra attribute sent alongside the product
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Wire form of the product line
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("productId".to_string(), Value::String(self.product_id.clone()));
        map.insert("quantity".to_string(), Value::from(self.quantity));
        Value::Object(map)
    }
}

/// Values accepted as an amount in minor currency units
///
/// Floating point inputs are truncated toward zero.
pub trait MinorUnits {
    fn into_minor_units(self) -> i64;
}

impl MinorUnits for i64 {
    fn into_minor_units(self) -> i64 {
        self
    }
}

impl MinorUnits for i32 {
    fn into_minor_units(self) -> i64 {
        i64::from(self)
    }
}

impl MinorUnits for u32 {
    fn into_minor_units(self) -> i64 {
        i64::from(self)
    }
}

impl MinorUnits for f64 {
    fn into_minor_units(self) -> i64 {
        self.trunc() as i64
    }
}

/// Whole percentages go out as integers, fractional ones as floats
pub(crate) fn percentage_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
