//! Connection management for MongoDB
//!
//! Establishes the client, verifies it with a `ping`, and hands out
//! collection-backed product stores.

use mongodb::bson::{Document, doc};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection, Database, options::ClientOptions};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{CatalogError, ConfigError, ErrorInfo, Result};
use crate::store::MongoProductStore;
use crate::utils::uri::sanitize_uri;

/// MongoDB connection manager
pub struct ConnectionManager {
    /// MongoDB client instance, present once connected
    client: Option<Client>,

    /// Connection configuration
    config: ConnectionConfig,

    /// Current connection state
    state: Arc<RwLock<ConnectionState>>,
}

/// Connection state information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,

    /// Currently connecting
    Connecting,

    /// Connected and ready
    Connected,

    /// Connection failed
    Failed(String),
}

impl ConnectionManager {
    /// Create a new connection manager
    ///
    /// No network activity happens until [`connect`](Self::connect).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            client: None,
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
        }
    }

    /// Establish connection to MongoDB
    ///
    /// The driver connects lazily, so the connection is confirmed with a
    /// `ping` before the manager reports `Connected`.
    ///
    /// # Returns
    /// * `Result<()>` - Success, `StoreUnavailable`, or `Config` for a bad URI
    pub async fn connect(&mut self) -> Result<()> {
        self.set_state(ConnectionState::Connecting).await;

        match self.open_client().await {
            Ok(client) => {
                info!("Connected to MongoDB at {}", sanitize_uri(&self.config.uri));
                self.client = Some(client);
                self.set_state(ConnectionState::Connected).await;
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Could not connect to MongoDB at {}: {}",
                    sanitize_uri(&self.config.uri),
                    e
                );
                self.set_state(ConnectionState::Failed(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Disconnect from MongoDB and release the connection pool
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            debug!("Disconnected from {}", sanitize_uri(&self.config.uri));
        }
        self.set_state(ConnectionState::Disconnected).await;
        Ok(())
    }

    /// Get the configured catalog database
    fn database(&self) -> Result<Database> {
        Ok(self.get_client()?.database(&self.config.database))
    }

    /// Get the configured products collection
    pub fn collection(&self) -> Result<Collection<Document>> {
        Ok(self.database()?.collection(&self.config.collection))
    }

    /// Build a product store over the configured collection
    pub fn product_store(&self) -> Result<MongoProductStore> {
        Ok(MongoProductStore::new(self.collection()?))
    }

    /// Get the MongoDB client
    ///
    /// # Returns
    /// * `Result<&Client>` - Reference to client, or `StoreUnavailable` before connect
    pub fn get_client(&self) -> Result<&Client> {
        self.client.as_ref().ok_or_else(|| {
            CatalogError::StoreUnavailable(ErrorInfo::new(
                "connection.notConnected",
                "not connected to MongoDB",
            ))
        })
    }

    /// Get current connection state
    pub async fn get_state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    /// Build the client and confirm the server answers
    async fn open_client(&self) -> Result<Client> {
        let options = self.client_options().await?;
        let client = Client::with_options(options)?;
        Self::ping(&client).await?;
        Ok(client)
    }

    /// Parse the URI and apply timeouts and application name
    ///
    /// `mongodb+srv://` URIs resolve SRV and TXT records here, so a parse
    /// failure is not necessarily a configuration mistake.
    async fn client_options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::parse(&self.config.uri)
            .await
            .map_err(|e| uri_error(&self.config.uri, e))?;

        let timeout = self.config.timeout_duration();
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.app_name = Some(self.config.app_name.clone());
        Ok(options)
    }

    async fn set_state(&self, new_state: ConnectionState) {
        *self.state.write().await = new_state;
    }

    /// Send a ping to the admin database
    async fn ping(client: &Client) -> Result<()> {
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}

/// Classify a URI parse failure
///
/// A malformed URI is a `Config` error; DNS and other resolution failures
/// go through the driver error classification.
fn uri_error(uri: &str, error: mongodb::error::Error) -> CatalogError {
    match error.kind.as_ref() {
        ErrorKind::InvalidArgument { message, .. } => {
            debug!("URI parse failed: {}", message);
            CatalogError::Config(ConfigError::InvalidValue {
                field: "connection.uri".to_string(),
                value: sanitize_uri(uri),
            })
        }
        _ => CatalogError::from(error),
    }
}
