//! FlexiMart Catalog Library
//!
//! Report and review operations over the FlexiMart product catalog stored
//! in a MongoDB `products` collection.
//!
//! # Modules
//!
//! - `catalog`: Report service (the business queries and the review update)
//! - `cli`: Command-line interface and argument parsing
//! - `clock`: Injectable source of "today"
//! - `config`: Configuration management
//! - `connection`: MongoDB connection management
//! - `error`: Error types and handling
//! - `formatter`: Output formatting and display
//! - `loader`: Bulk import of JSON catalog files
//! - `model`: Product, review and report records
//! - `store`: Collection capability and its MongoDB implementation
//! - `utils`: Utility functions and helpers
//!
//! # Example
//!
//! ```no_run
//! use fleximart_catalog::{CatalogReportService, ConnectionManager, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let mut manager = ConnectionManager::new(config.connection);
//!     manager.connect().await?;
//!
//!     let store = manager.product_store()?;
//!     let service = CatalogReportService::new(&store);
//!     for row in service.find_top_rated_products(4.0).await? {
//!         println!("{} {:.2}", row.product_name, row.avg_rating);
//!     }
//!
//!     manager.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod clock;
pub mod config;
pub mod connection;
pub mod error;
pub mod formatter;
pub mod loader;
pub mod model;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use catalog::CatalogReportService;
pub use config::Config;
pub use connection::ConnectionManager;
pub use error::{CatalogError, Result};
pub use formatter::Formatter;
pub use store::{MongoProductStore, ProductStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
