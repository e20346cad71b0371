//! Connection management for MongoDB
//!
//! This module handles:
//! - Resolving the database name from a connection URI
//! - Establishing a client with a server-selection timeout
//! - Verifying the connection with a ping before any work starts

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::error::ErrorKind;
use mongodb::{Client, options::ClientOptions};
use tracing::{debug, info};

use crate::client::MongoStore;
use crate::config::ConnectionConfig;
use crate::error::mongo::is_connection_failure;
use crate::error::{ConnectionError, MongoSaveError, Result};

/// Database used when neither the options nor the URI name one
pub const DEFAULT_DATABASE: &str = "test";

/// Application name reported to the server
const APP_NAME: &str = "mongo-save";

/// MongoDB connection manager
///
/// Owns the connection URI and timeout settings; `connect` hands back a
/// [`MongoStore`] bound to the requested database.
pub struct ConnectionManager {
    /// Connection URI
    uri: String,

    /// Connection configuration
    config: ConnectionConfig,
}

impl ConnectionManager {
    /// Create a new connection manager
    ///
    /// # Arguments
    /// * `uri` - MongoDB connection URI
    /// * `config` - Connection configuration
    pub fn new(uri: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            uri: uri.into(),
            config,
        }
    }

    /// Connect and verify the server answers a ping
    ///
    /// # Arguments
    /// * `database` - Database the returned store is bound to
    ///
    /// # Returns
    /// * `Result<MongoStore>` - Connected store or `Connection` error
    pub async fn connect(&self, database: &str) -> Result<MongoStore> {
        info!("Connecting to {}", sanitize_uri(&self.uri));

        let options = self.client_options().await?;
        let client = Client::with_options(options)
            .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;

        self.ping(&client, database).await?;
        debug!("Connected, using database '{}'", database);

        Ok(MongoStore::new(client, database))
    }

    /// Parse the URI and apply timeout settings
    async fn client_options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::parse(self.uri.as_str())
            .await
            .map_err(|e| match e.kind.as_ref() {
                ErrorKind::InvalidArgument { message, .. } => {
                    MongoSaveError::from(ConnectionError::InvalidUri(message.clone()))
                }
                _ => MongoSaveError::from(ConnectionError::ConnectionFailed(e.to_string())),
            })?;

        let timeout = Duration::from_secs(self.config.timeout);
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_string());
        }
        Ok(options)
    }

    /// Send a ping so unreachable servers fail here rather than mid-run
    async fn ping(&self, client: &Client, database: &str) -> Result<()> {
        client
            .database(database)
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| {
                if matches!(e.kind.as_ref(), ErrorKind::ServerSelection { .. }) {
                    MongoSaveError::from(ConnectionError::Timeout)
                } else if is_connection_failure(&e) {
                    MongoSaveError::from(ConnectionError::ConnectionFailed(e.to_string()))
                } else {
                    MongoSaveError::from(ConnectionError::PingFailed(e.to_string()))
                }
            })
    }
}

/// Extract database name from MongoDB connection URI
///
/// Format: `mongodb://[username:password@]host[:port][/database][?options]`
///
/// # Returns
/// * `Option<String>` - Database name if the URI has a non-empty path
pub fn extract_database_from_uri(uri: &str) -> Option<String> {
    let after_scheme = uri.split("://").nth(1)?;
    let path_part = after_scheme.split_once('/')?.1;
    let db_name = path_part.split('?').next().unwrap_or("");
    if db_name.is_empty() {
        None
    } else {
        Some(db_name.to_string())
    }
}

/// Pick the database: explicit name, then URI path, then [`DEFAULT_DATABASE`]
pub fn resolve_database_name(explicit: Option<&str>, uri: &str) -> String {
    explicit
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| extract_database_from_uri(uri))
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

/// Hide credentials in a URI before it is printed or logged
pub fn sanitize_uri(uri: &str) -> String {
    if let (Some(proto_end), Some(host_start)) = (uri.find("://"), uri.rfind('@')) {
        if host_start > proto_end {
            return format!("{}***{}", &uri[..proto_end + 3], &uri[host_start..]);
        }
    }
    uri.to_string()
}
