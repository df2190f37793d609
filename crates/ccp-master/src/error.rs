//! Error types for the master engine.

use std::time::Duration;

use ccp_protocol::{CommandCode, ProtocolError, ReturnCode};
use thiserror::Error;

/// Failures at the transport boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport was shut down or its peer went away.
    #[error("transport closed")]
    Closed,

    /// The link reported a failure.
    #[error("link error: {0}")]
    Link(String),

    /// I/O error from an OS-backed adapter.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid YAML for the expected shape.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration parsed but is inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors returned by the master.
#[derive(Debug, Error)]
pub enum CcpError {
    /// A command argument could not be encoded. Nothing was sent.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No correlated response arrived within the command's window.
    #[error("{command} timed out after {timeout:?}")]
    Timeout {
        /// Command that timed out.
        command: CommandCode,
        /// Window that elapsed.
        timeout: Duration,
    },

    /// A response arrived on the expected identifier with another counter.
    #[error("{command} counter mismatch: sent {expected}, received {actual}")]
    CounterMismatch {
        /// Command sent.
        command: CommandCode,
        /// Counter sent.
        expected: u8,
        /// Counter echoed.
        actual: u8,
    },

    /// The response could not be decoded.
    #[error("malformed response to {command}: {source}")]
    MalformedResponse {
        /// Command sent.
        command: CommandCode,
        /// Decoding failure.
        source: ProtocolError,
    },

    /// The slave answered with an error return code.
    #[error("{command} rejected by slave: {code}")]
    Rejected {
        /// Command sent.
        command: CommandCode,
        /// Return code received.
        code: ReturnCode,
    },

    /// Send or receive failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Another open session already listens on this response identifier.
    #[error("response identifier 0x{0:X} is already in use")]
    DuplicateResponseId(u32),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CcpError {
    /// Whether the failure is a bus condition rather than a caller bug.
    ///
    /// Protocol failures may succeed when the command is re-issued; the others
    /// will not.
    pub fn is_protocol_failure(&self) -> bool {
        matches!(
            self,
            CcpError::Timeout { .. }
                | CcpError::CounterMismatch { .. }
                | CcpError::MalformedResponse { .. }
                | CcpError::Rejected { .. }
                | CcpError::Transport(_)
        )
    }
}

/// Result type alias for master operations.
pub type CcpResult<T> = Result<T, CcpError>;
