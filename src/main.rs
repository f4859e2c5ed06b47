//! FlexiMart catalog reports
//!
//! Runs one report or mutation per invocation against MongoDB.
//!
//! # Usage
//!
//! ```bash
//! fleximart top-rated --min-rating 4.5
//! fleximart category-summary --format json
//! ```

use fleximart_catalog::cli::{CliInterface, commands};
use fleximart_catalog::error::Result;
use fleximart_catalog::store::ProductStore;
use fleximart_catalog::utils::uri::sanitize_uri;
use fleximart_catalog::{CatalogReportService, ConnectionManager, Formatter};
use tracing::{Level, info};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle store-less subcommands
/// 4. Open the store, run the command, print its output
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand()? {
        return Ok(());
    }

    let output = run_online(&cli).await?;
    println!("{}", output);
    Ok(())
}

/// Connect, run the command, and disconnect regardless of its outcome
async fn run_online(cli: &CliInterface) -> Result<String> {
    let connection = &cli.config().connection;
    info!(
        "Connecting to {} ({}.{})",
        sanitize_uri(&connection.uri),
        connection.database,
        connection.collection
    );

    let mut manager = ConnectionManager::new(connection.clone());
    manager.connect().await?;

    let store = manager.product_store()?;
    let output = execute(cli, &store).await;

    manager.disconnect().await?;
    output
}

/// Run the parsed subcommand against a store
async fn execute(cli: &CliInterface, store: &dyn ProductStore) -> Result<String> {
    let service = CatalogReportService::new(store);
    let display = &cli.config().display;
    let formatter = Formatter::new(display.format).with_max_column_width(display.max_column_width);
    commands::run(cli.command(), cli.config(), &service, &formatter).await
}

/// Initialize logging system based on verbosity level
///
/// Logs go to stderr so report output on stdout stays machine-readable.
fn initialize_logging(cli: &CliInterface) {
    let level: Level = cli.config().logging.level.to_tracing_level();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
