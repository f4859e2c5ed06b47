//! Error handling for catalog operations.
//!
//! This module provides:
//! - The crate-wide [`CatalogError`] taxonomy (not found, invalid argument,
//!   store unavailable, query failures, configuration)
//! - Structured error information extracted from MongoDB driver errors
//! - Classification of driver errors into transport vs. query failures
//!
//! # Example
//!
//! ```rust,no_run
//! use fleximart_catalog::error::{CatalogError, Result};
//!
//! fn check_threshold(threshold: i64) -> Result<()> {
//!     if threshold < 0 {
//!         return Err(CatalogError::InvalidArgument(format!(
//!             "threshold must be non-negative, got {threshold}"
//!         )));
//!     }
//!     Ok(())
//! }
//! ```

pub mod kinds;
pub mod mongo;

// Re-export commonly used types
pub use kinds::{CatalogError, ConfigError, QueryError, Result};
pub use mongo::{ErrorInfo, StoreFailure};
