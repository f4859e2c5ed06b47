//! Command-line interface for the catalog reports
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - The `config` subcommand, which needs no store

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, LogLevel, OutputFormat};
use crate::error::Result;
use crate::utils::uri::sanitize_uri;

pub mod commands;

/// Extract database name from MongoDB connection URI
///
/// Format: mongodb://[username:password@]host[:port][/database][?options]
fn extract_database_from_uri(uri: &str) -> Option<String> {
    let after_scheme = uri.split("://").nth(1)?;
    let path_part = after_scheme.split('/').nth(1)?;
    let db_name = path_part.split('?').next().unwrap_or("");
    if db_name.is_empty() {
        None
    } else {
        Some(db_name.to_string())
    }
}

/// FlexiMart catalog reports over MongoDB
#[derive(Parser, Debug)]
#[command(
    name = "fleximart",
    version,
    about = "Product catalog reports for FlexiMart",
    long_about = "Query and update the FlexiMart product catalog stored in MongoDB."
)]
pub struct CliArgs {
    /// MongoDB connection URI
    #[arg(long, value_name = "URI", global = true)]
    pub uri: Option<String>,

    /// Database name to use
    #[arg(long, value_name = "NAME", global = true)]
    pub database: Option<String>,

    /// Products collection name
    #[arg(long, value_name = "NAME", global = true)]
    pub collection: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Output format (table, json, json-pretty)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<String>,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for fleximart
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Products in a category priced below a ceiling
    Affordable {
        /// Category name
        #[arg(long)]
        category: Option<String>,

        /// Exclusive price ceiling
        #[arg(long = "max-price", value_name = "PRICE")]
        max_price: Option<f64>,
    },

    /// Products with a high average review rating
    TopRated {
        /// Inclusive minimum average rating
        #[arg(long = "min-rating", value_name = "RATING")]
        min_rating: Option<f64>,
    },

    /// Append a review to a product
    AddReview {
        /// Target product id
        product_id: String,

        #[arg(long = "user-id")]
        user_id: String,

        #[arg(long)]
        username: String,

        /// Rating from 1 to 5
        #[arg(long)]
        rating: f64,

        #[arg(long, default_value = "")]
        comment: String,

        /// Review date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Show the reviews of a product
    Reviews {
        /// Product id
        product_id: String,
    },

    /// Average, minimum and maximum price per category
    CategorySummary,

    /// Products with stock below a threshold
    LowStock {
        /// Exclusive stock threshold
        #[arg(long)]
        threshold: Option<i64>,
    },

    /// Products carrying a tag
    Tagged {
        /// Tag to look up
        #[arg(default_value = "smartphone")]
        tag: String,
    },

    /// Number of products per subcategory
    SubcategoryCounts,

    /// Insert the products of a JSON catalog file
    Load {
        /// JSON array of products
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,

        /// Write the effective configuration to the configuration file
        #[arg(long)]
        save: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Effective configuration
    config: Config,
}

impl CliInterface {
    /// Parse process arguments and load configuration
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load file and environment layers, then apply and check CLI overrides
    ///
    /// The `config` subcommand skips the check so it can inspect and report
    /// on a broken file.
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, args)?;
        if !matches!(args.command, Commands::Config { .. }) {
            config.validate()?;
        }
        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subcommand to run
    pub fn command(&self) -> &Commands {
        &self.args.command
    }

    /// Apply CLI arguments to configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) -> Result<()> {
        Self::apply_connection_args(config, args);

        if let Some(format) = &args.format {
            config.display.format = OutputFormat::parse(format)?;
        }

        if args.very_verbose {
            config.logging.level = LogLevel::Trace;
        } else if args.verbose {
            config.logging.level = LogLevel::Debug;
        }
        Ok(())
    }

    /// Connection overrides; an explicit `--database` beats the URI path
    fn apply_connection_args(config: &mut Config, args: &CliArgs) {
        if let Some(uri) = &args.uri {
            config.connection.uri = uri.clone();
            if let Some(db) = extract_database_from_uri(uri) {
                config.connection.database = db;
            }
        }
        if let Some(database) = &args.database {
            config.connection.database = database.clone();
        }
        if let Some(collection) = &args.collection {
            config.connection.collection = collection.clone();
        }
        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }
    }

    /// Handle subcommands that need no store
    ///
    /// # Returns
    /// * `Result<bool>` - True if the subcommand was handled here
    pub fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Commands::Config {
                show,
                validate,
                save,
            } => {
                self.handle_config_command(*show, *validate, *save)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn handle_config_command(&self, show: bool, validate: bool, save: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if save {
            self.save_config()?;
        }

        if show || !(validate || save) {
            self.show_config()?;
        }

        Ok(())
    }

    /// Persist the effective configuration, refusing one that fails validation
    fn save_config(&self) -> Result<()> {
        self.config.validate()?;
        let path = self.config_path();
        self.config.save(&path)?;
        println!("Configuration saved to {}", path.display());
        Ok(())
    }

    fn validate_config_file(&self) {
        let path = self.config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist, defaults apply");
            return;
        }

        match Config::from_file(&path).and_then(|config| config.validate()) {
            Ok(()) => println!("Configuration is valid"),
            Err(e) => println!("Configuration is invalid: {}", e),
        }
    }

    fn show_config(&self) -> Result<()> {
        println!("Configuration file: {}", self.config_path().display());
        println!();

        let mut shown = self.config.clone();
        shown.connection.uri = sanitize_uri(&shown.connection.uri);
        print!("{}", shown.to_toml()?);
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }
}
