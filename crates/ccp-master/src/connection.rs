//! Per-station connection state.

use ccp_protocol::{MemoryAddress, MtaSlot, ResourceMask};
use parking_lot::{Mutex, MutexGuard};
use tracing::Span;

use crate::config::ConnectionConfig;
use crate::error::CcpError;
use crate::sequencer::Sequencer;

/// Mutable state the master tracks for one slave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// Whether CONNECT succeeded and no DISCONNECT followed.
    pub connected: bool,
    /// Memory transfer addresses last set with SET_MTA, by slot.
    pub mta: [Option<MemoryAddress>; 2],
    /// Resources reported unlocked by the last UNLOCK.
    pub unlocked: ResourceMask,
    /// Description of the most recent failure.
    pub last_error: Option<String>,
}

/// Identifiers, counter and state of one slave station.
#[derive(Debug)]
pub struct Connection {
    config: ConnectionConfig,
    sequencer: Sequencer,
    state: Mutex<ConnectionState>,
    transaction_lock: Mutex<()>,
    span: Span,
}

impl Connection {
    /// Create a connection logging into `span`.
    pub fn new(config: ConnectionConfig, span: Span) -> Self {
        Connection {
            config,
            sequencer: Sequencer::default(),
            state: Mutex::new(ConnectionState::default()),
            transaction_lock: Mutex::new(()),
            span,
        }
    }

    /// Create a connection with a span named after its configuration.
    pub fn with_default_span(config: ConnectionConfig) -> Self {
        let span = tracing::debug_span!(
            "ccp_connection",
            connection = %config.name,
            cro_id = config.cro_id,
            dto_id = config.dto_id
        );
        Self::new(config, span)
    }

    /// Connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Connection name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// CAN identifier of command frames.
    pub fn cro_id(&self) -> u32 {
        self.config.cro_id
    }

    /// CAN identifier of response frames.
    pub fn dto_id(&self) -> u32 {
        self.config.dto_id
    }

    /// Station address.
    pub fn station_address(&self) -> u16 {
        self.config.station_address
    }

    /// Command counter.
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Span transactions on this connection are logged in.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.state.lock().clone()
    }

    /// Whether the slave is connected.
    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    /// Pointer last stored in `slot`.
    pub fn mta(&self, slot: MtaSlot) -> Option<MemoryAddress> {
        self.state.lock().mta[slot.index()]
    }

    /// Resources currently unlocked.
    pub fn unlocked(&self) -> ResourceMask {
        self.state.lock().unlocked
    }

    /// Most recent failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Most recent failure, clearing it.
    pub fn take_last_error(&self) -> Option<String> {
        self.state.lock().last_error.take()
    }

    pub(crate) fn lock_transactions(&self) -> MutexGuard<'_, ()> {
        self.transaction_lock.lock()
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut ConnectionState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub(crate) fn record_error(&self, error: &CcpError) {
        self.state.lock().last_error = Some(error.to_string());
    }
}
