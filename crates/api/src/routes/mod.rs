pub mod balance;
pub mod health;
pub mod metrics;
pub mod subscriber;
