//! Entry point: one master per transport.

use std::sync::Arc;

use tracing::{info, Span};

use crate::config::{ConnectionConfig, MasterConfig};
use crate::connection::Connection;
use crate::error::{CcpResult, ConfigError};
use crate::session::Session;
use crate::transaction::TransactionEngine;
use crate::transport::Transport;

/// A CCP master on one CAN transport.
///
/// Sessions opened from the same master share the transport; each must use
/// its own response identifier.
pub struct Master<T: Transport> {
    engine: Arc<TransactionEngine<T>>,
    config: MasterConfig,
}

impl<T: Transport> Master<T> {
    /// Create a master with default settings.
    pub fn new(transport: Arc<T>) -> Self {
        let config = MasterConfig::default();
        Master {
            engine: Arc::new(TransactionEngine::new(
                transport,
                config.poll_interval(),
                config.timeout_table(),
            )),
            config,
        }
    }

    /// Create a master from a validated configuration.
    pub fn with_config(transport: Arc<T>, config: MasterConfig) -> CcpResult<Self> {
        config.validate()?;
        let engine = TransactionEngine::new(transport, config.poll_interval(), config.timeout_table());
        Ok(Master {
            engine: Arc::new(engine),
            config,
        })
    }

    /// Master configuration.
    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    /// Transaction engine shared by this master's sessions.
    pub fn engine(&self) -> &Arc<TransactionEngine<T>> {
        &self.engine
    }

    /// Open a session logging into a span derived from the connection name.
    pub fn open(&self, connection: ConnectionConfig) -> CcpResult<Session<T>> {
        Session::open(Arc::clone(&self.engine), Connection::with_default_span(connection))
    }

    /// Open a session logging into `span`.
    pub fn open_with_span(&self, connection: ConnectionConfig, span: Span) -> CcpResult<Session<T>> {
        Session::open(Arc::clone(&self.engine), Connection::new(connection, span))
    }

    /// Open the session configured under `name`.
    pub fn open_named(&self, name: &str) -> CcpResult<Session<T>> {
        let connection = self
            .config
            .connection(name)
            .cloned()
            .ok_or_else(|| ConfigError::Invalid(format!("no connection named '{}'", name)))?;
        self.open(connection)
    }

    /// Release the transport. Open sessions fail from here on.
    pub fn shutdown(&self) -> CcpResult<()> {
        info!("shutting down transport");
        self.engine.router().shutdown()?;
        Ok(())
    }
}

impl<T: Transport> std::fmt::Debug for Master<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Master")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish()
    }
}
