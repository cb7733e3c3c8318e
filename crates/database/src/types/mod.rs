//! Shared types for the persistence layer.

pub mod errors;

pub use errors::StoreError;

/// Result type for repository operations
pub type StoreResult<T> = Result<T, StoreError>;
