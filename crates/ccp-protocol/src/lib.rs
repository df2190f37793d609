//! CAN Calibration Protocol (CCP) master-side encodings
//!
//! This crate provides the I/O-free half of a CCP master: the command set,
//! its byte-level encoding into 8-byte CAN frames, and typed views over the
//! slave's responses. Nothing here touches a bus; the `ccp-master` crate
//! drives these types over a transport.
//!
//! # Protocol Overview
//!
//! Every exchange is one command frame (CRO, master → slave) answered by one
//! response frame (DTO, slave → master), both exactly 8 bytes:
//!
//! ```text
//! CRO: +--------+---------+---------------------------+
//!      | opcode | counter | payload[0..6] (zero-pad)  |
//!      +--------+---------+---------------------------+
//! DTO: +--------+---------+---------------------------+
//!      | return | counter | payload[0..6]             |
//!      +--------+---------+---------------------------+
//! ```
//!
//! The counter is echoed by the slave and is the only correlation between a
//! command and its response.
//!
//! # Example
//!
//! ```rust
//! use ccp_protocol::{Command, MtaSlot, CommandFrame};
//!
//! let cmd = Command::SetMta { slot: MtaSlot::Mta0, extension: 0, address: 0x1234_5678 };
//! let payload = cmd.encode_payload().unwrap();
//! let frame = CommandFrame::new(cmd.code(), 7, &payload).unwrap();
//! assert_eq!(frame.as_bytes()[..2], [0x02, 7]);
//! ```

mod commands;
mod constants;
mod error;
mod field;
mod frame;
mod responses;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use field::*;
pub use frame::*;
pub use responses::*;
pub use types::*;
