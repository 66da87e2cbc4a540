//! Shared identifier types for the bank projection services.

pub mod types;

pub use types::{AccountId, TransactionId, UserId, Version};
