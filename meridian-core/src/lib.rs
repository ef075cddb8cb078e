pub mod idempotency;
pub mod payment;
pub mod repository;
pub mod search;

/// Boxed error used at every repository-trait boundary.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;
