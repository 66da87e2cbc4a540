//! Transaction records consumed from the event bus.

pub mod payload;
pub mod timestamp;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{AccountId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

pub use payload::TransactionPayload;
pub use timestamp::{parse_timestamp, parse_timestamp_value};

/// Direction of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdraw => "WITHDRAW",
        }
    }

    /// Returns the amount as a signed balance delta.
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            TransactionType::Deposit => amount,
            TransactionType::Withdraw => -amount,
        }
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TransactionType::Deposit),
            "WITHDRAW" => Ok(TransactionType::Withdraw),
            other => Err(DomainError::InvalidTransactionType(other.to_string())),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single ledger event: a deposit into or withdrawal from an account.
///
/// Immutable once built. Construct one from an inbound payload with
/// [`Transaction::decode`], or directly with [`Transaction::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    account_id: AccountId,
    amount: Money,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    status: String,
    description: String,
    timestamp: DateTime<Utc>,
    version: i64,
}

impl Transaction {
    /// Creates a new transaction builder.
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    /// Decodes and validates a JSON-encoded transaction record.
    pub fn decode(data: &str) -> Result<Self, DomainError> {
        let payload: TransactionPayload = serde_json::from_str(data)?;
        Self::try_from(payload)
    }

    /// Validates an already-parsed JSON transaction record.
    pub fn decode_value(data: serde_json::Value) -> Result<Self, DomainError> {
        let payload: TransactionPayload = serde_json::from_value(data)?;
        Self::try_from(payload)
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Magnitude of the movement; never negative.
    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Caller-supplied version, preserved but not interpreted.
    pub fn version(&self) -> i64 {
        self.version
    }
}

/// Builder for constructing transactions.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    id: Option<TransactionId>,
    account_id: Option<AccountId>,
    amount: Option<Money>,
    transaction_type: Option<TransactionType>,
    status: Option<String>,
    description: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    version: Option<i64>,
}

impl TransactionBuilder {
    pub fn id(mut self, id: impl Into<TransactionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn account_id(mut self, account_id: impl Into<AccountId>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    /// Sets the workflow status. Defaults to an empty string.
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the description. Defaults to an empty string.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an already-structured timestamp. If not set, the current time is used.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the caller version. Defaults to 1.
    pub fn version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Builds the transaction.
    ///
    /// # Panics
    ///
    /// Panics if `id`, `account_id`, `amount` or `transaction_type` is not set.
    pub fn build(self) -> Transaction {
        Transaction {
            id: self.id.expect("id is required"),
            account_id: self.account_id.expect("account_id is required"),
            amount: self.amount.expect("amount is required"),
            transaction_type: self.transaction_type.expect("transaction_type is required"),
            status: self.status.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            version: self.version.unwrap_or(1),
        }
    }

    /// Tries to build the transaction, returning None if required fields are missing.
    pub fn try_build(self) -> Option<Transaction> {
        Some(Transaction {
            id: self.id?,
            account_id: self.account_id?,
            amount: self.amount?,
            transaction_type: self.transaction_type?,
            status: self.status.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            version: self.version.unwrap_or(1),
        })
    }
}
