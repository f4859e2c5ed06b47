//! Report subcommands run against a product store

use tracing::debug;

use crate::catalog::CatalogReportService;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::formatter::Formatter;
use crate::loader;
use crate::model::NewReview;

use super::Commands;

/// Run one subcommand and render its output
///
/// Parameters left out on the command line fall back to `config.reports`.
pub async fn run<C: Clock>(
    command: &Commands,
    config: &Config,
    service: &CatalogReportService<'_, C>,
    formatter: &Formatter,
) -> Result<String> {
    let reports = &config.reports;
    debug!("Running {:?}", command);

    match command {
        Commands::Affordable {
            category,
            max_price,
        } => {
            let category = category.as_deref().unwrap_or(&reports.category);
            let ceiling = max_price.unwrap_or(reports.price_ceiling);
            let rows = service.find_affordable_products(category, ceiling).await?;
            formatter.format(&rows)
        }
        Commands::TopRated { min_rating } => {
            let min = min_rating.unwrap_or(reports.min_average_rating);
            let rows = service.find_top_rated_products(min).await?;
            formatter.format(&rows)
        }
        Commands::AddReview {
            product_id,
            user_id,
            username,
            rating,
            comment,
            date,
        } => {
            let review = NewReview {
                user_id: user_id.clone(),
                username: username.clone(),
                rating: *rating,
                comment: comment.clone(),
                date: date.clone(),
            };
            let stored = service.add_review(product_id, review).await?;
            formatter.format_one(&stored)
        }
        Commands::Reviews { product_id } => {
            let rows = service.product_reviews(product_id).await?;
            formatter.format(&rows)
        }
        Commands::CategorySummary => {
            let rows = service.category_price_summary().await?;
            formatter.format(&rows)
        }
        Commands::LowStock { threshold } => {
            let threshold = threshold.unwrap_or(reports.low_stock_threshold);
            let rows = service.low_stock_products(threshold).await?;
            formatter.format(&rows)
        }
        Commands::Tagged { tag } => {
            let rows = service.products_with_tag(tag).await?;
            formatter.format(&rows)
        }
        Commands::SubcategoryCounts => {
            let rows = service.subcategory_counts().await?;
            formatter.format(&rows)
        }
        Commands::Load { file } => {
            let summary = loader::load_catalog_file(service.store(), file).await?;
            Ok(format!(
                "Loaded {} products ({} in collection)",
                summary.inserted, summary.total
            ))
        }
        Commands::Config { .. } => Err(CatalogError::Generic(
            "config is handled before a store is opened".to_string(),
        )),
    }
}
