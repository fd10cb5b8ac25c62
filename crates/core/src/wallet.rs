use crate::models::WalletBalance;
use crate::payload::{decode_result, render_raw};
use crate::traits::ApiError;
use serde_json::Value;
use std::fmt;

/// Outcome of the authenticated wallet probe.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletCheck {
    /// The response reported `success`.
    Ok,
    /// Anything else; the raw response is kept for printing.
    Failed(Value),
}

impl WalletCheck {
    pub fn evaluate(response: Value) -> Self {
        if response.get("success").is_some_and(is_truthy) {
            WalletCheck::Ok
        } else {
            WalletCheck::Failed(response)
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, WalletCheck::Ok)
    }
}

impl fmt::Display for WalletCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletCheck::Ok => f.write_str("OK"),
            WalletCheck::Failed(raw) => f.write_str(&render_raw(raw)),
        }
    }
}

/// JSON truthiness: `false`, `null`, zero and empty containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Decode the per-asset rows of a wallet response.
pub fn parse_balances(response: &Value) -> Result<Vec<WalletBalance>, ApiError> {
    decode_result(response)
}
