//! Strict decoding of inbound transaction payloads.

use serde::Deserialize;

use super::{Transaction, TransactionType, parse_timestamp_value};
use crate::error::DomainError;
use crate::money::Money;

/// Wire shape of a transaction record as published on the bus.
///
/// Every field is required. `amount` and `timestamp` are kept as raw JSON
/// so that their type errors surface as the specific
/// [`DomainError`] variants rather than a generic schema error.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPayload {
    pub id: String,
    #[serde(alias = "accountId")]
    pub account_id: String,
    pub amount: serde_json::Value,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub status: String,
    pub description: String,
    pub timestamp: serde_json::Value,
    pub version: i64,
}

impl TryFrom<TransactionPayload> for Transaction {
    type Error = DomainError;

    fn try_from(payload: TransactionPayload) -> Result<Self, Self::Error> {
        let transaction_type: TransactionType = payload.transaction_type.parse()?;
        let amount = parse_amount(&payload.amount)?.non_negative()?;
        let timestamp = parse_timestamp_value(&payload.timestamp)?;

        Ok(Transaction {
            id: payload.id.into(),
            account_id: payload.account_id.into(),
            amount,
            transaction_type,
            status: payload.status,
            description: payload.description,
            timestamp,
            version: payload.version,
        })
    }
}

/// Reads an amount given either as a JSON number or a decimal string.
fn parse_amount(value: &serde_json::Value) -> Result<Money, DomainError> {
    match value {
        serde_json::Value::String(s) => s.parse(),
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string().parse(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) => Money::from_f64(f),
            None => Err(DomainError::InvalidAmount {
                input: n.to_string(),
                reason: "not a decimal number",
            }),
        },
        other => Err(DomainError::InvalidAmount {
            input: other.to_string(),
            reason: "expected a number or decimal string",
        }),
    }
}
