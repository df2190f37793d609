//! CAN Calibration Protocol (CCP) master
//!
//! Drives CCP 2.1 command/response transactions against one or more slave
//! ECUs over a shared CAN transport.
//!
//! - [`Master`] owns the transport and opens [`Session`]s.
//! - A [`Session`] is one slave station: it numbers commands, waits for the
//!   correlated response and tracks memory pointers and unlocked resources.
//! - [`Transport`] is the only I/O boundary; [`sim::VirtualBus`] and
//!   [`sim::ReplayTransport`] implement it in-process.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ccp_master::{ConnectionConfig, Master, sim::VirtualBus};
//! use ccp_protocol::{MemoryAddress, MtaSlot};
//!
//! let bus = VirtualBus::new();
//! let master = Master::new(Arc::new(bus.node()));
//! let ecu = master.open(ConnectionConfig::new("engine_ecu", 0x39, 0x7E0, 0x7E1))?;
//!
//! ecu.connect()?;
//! ecu.set_mta(MtaSlot::Mta0, MemoryAddress::new(0, 0x1234_5678))?;
//! let bytes = ecu.upload(4)?;
//! # Ok::<(), ccp_master::CcpError>(())
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod master;
pub mod router;
pub mod sequencer;
pub mod session;
pub mod sim;
pub mod transaction;
pub mod transport;

pub use config::{ConnectionConfig, MasterConfig, TimeoutTable};
pub use connection::{Connection, ConnectionState};
pub use error::{CcpError, CcpResult, ConfigError, TransportError};
pub use master::Master;
pub use router::FrameRouter;
pub use sequencer::Sequencer;
pub use session::Session;
pub use transaction::TransactionEngine;
pub use transport::{CanFrame, Transport};
