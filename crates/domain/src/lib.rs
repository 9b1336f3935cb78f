//! Pharmacy Order Fulfillment Domain

/// Order aggregate and its fulfillment state machine
pub mod orders;

/// Prescriptions and their current order
pub mod prescriptions;

/// Related documents and their resolver
pub mod references;

/// Order number generation
pub mod order_number;

/// Closed string vocabularies
pub mod vocabulary;

/// DynamoDB adapters
pub mod store;

/// Store configuration
pub mod config;

/// Domain errors
pub mod errors;

/// Domain events wrapper
pub mod event;

pub use config::StoreConfig;
pub use errors::Error;
pub use event::DomainEvent;
pub use order_number::{OrderNumber, OrderNumberGenerator};
pub use store::DynamoStore;
