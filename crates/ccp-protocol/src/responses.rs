//! Typed views over the payload of a command return message.
//!
//! The transaction layer hands back a [`ResponseFrame`]; the types here read
//! the command-specific fields out of its 6-byte payload.

use crate::commands::CommandCode;
use crate::error::ProtocolError;
use crate::field::fields;
use crate::frame::ResponseFrame;
use crate::types::*;

/// A value decoded from the payload of an acknowledged response.
pub trait DecodeResponse: Sized {
    /// Decode from the 6-byte response payload.
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError>;

    /// Decode from a response frame.
    fn from_frame(frame: &ResponseFrame) -> Result<Self, ProtocolError> {
        Self::decode(&frame.payload)
    }
}

fn require(command: CommandCode, payload: &[u8], expected: usize) -> Result<(), ProtocolError> {
    require_labelled(command.mnemonic(), payload, expected)
}

fn require_labelled(label: &'static str, payload: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if payload.len() < expected {
        return Err(ProtocolError::ResponseTooShort {
            command: label,
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

impl DecodeResponse for () {
    fn decode(_payload: &[u8]) -> Result<Self, ProtocolError> {
        Ok(())
    }
}

/// Protocol version implemented by the slave (GET_CCP_VERSION).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcpVersion {
    /// Main protocol version.
    pub major: u8,
    /// Release within the version.
    pub minor: u8,
}

impl DecodeResponse for CcpVersion {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(CommandCode::GetCcpVersion, payload, 2)?;
        Ok(CcpVersion {
            major: payload[0],
            minor: payload[1],
        })
    }
}

impl std::fmt::Display for CcpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Slave identification summary (EXCHANGE_ID).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaveId {
    /// Length of the slave device ID, readable by UPLOAD from MTA0.
    pub id_length: u8,
    /// Data type qualifier of the slave device ID.
    pub data_type: u8,
    /// Resources the slave offers.
    pub availability: ResourceMask,
    /// Resources protected by seed and key.
    pub protection: ResourceMask,
}

impl DecodeResponse for SlaveId {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(CommandCode::ExchangeId, payload, 4)?;
        Ok(SlaveId {
            id_length: payload[0],
            data_type: payload[1],
            availability: ResourceMask(payload[2]),
            protection: ResourceMask(payload[3]),
        })
    }
}

/// Seed returned by GET_SEED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    /// Whether the resource is protected; if not, no UNLOCK is needed.
    pub protected: bool,
    /// Seed bytes to be turned into a key by the caller.
    pub seed: [u8; 4],
}

impl DecodeResponse for Seed {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(CommandCode::GetSeed, payload, 5)?;
        let mut seed = [0u8; 4];
        seed.copy_from_slice(&payload[1..5]);
        Ok(Seed {
            protected: payload[0] != 0,
            seed,
        })
    }
}

/// Current privilege status returned by UNLOCK.
impl DecodeResponse for ResourceMask {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(CommandCode::Unlock, payload, 1)?;
        Ok(ResourceMask(payload[0]))
    }
}

/// MTA0 position reported after DNLOAD / PROGRAM, or the active page start.
pub type MtaPosition = MemoryAddress;

impl DecodeResponse for MemoryAddress {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        // Shared by DNLOAD, DNLOAD_6, PROGRAM, PROGRAM_6 and GET_ACTIVE_CAL_PAGE.
        require_labelled("MTA position", payload, 5)?;
        let mut rest = &payload[1..];
        let address = fields::RESPONSE_MTA_ADDRESS.get(&mut rest).unwrap_or_default();
        Ok(MemoryAddress {
            extension: payload[0],
            address,
        })
    }
}

/// DAQ list size (GET_DAQ_SIZE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaqSize {
    /// Number of ODTs in the list.
    pub odt_count: u8,
    /// PID of the first ODT.
    pub first_pid: u8,
}

impl DecodeResponse for DaqSize {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(CommandCode::GetDaqSize, payload, 2)?;
        Ok(DaqSize {
            odt_count: payload[0],
            first_pid: payload[1],
        })
    }
}

/// Session status (GET_S_STATUS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatusInfo {
    /// Status bits.
    pub status: SessionStatus,
    /// Qualifier of the additional information, 0 if there is none.
    pub qualifier: u8,
    /// Additional, slave-specific status information.
    pub info: [u8; 4],
}

impl SessionStatusInfo {
    /// Whether the slave sent additional status information.
    pub fn has_additional_info(&self) -> bool {
        self.qualifier != 0
    }
}

impl DecodeResponse for SessionStatusInfo {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(CommandCode::GetSStatus, payload, 2)?;
        let mut info = [0u8; 4];
        let extra = &payload[2..payload.len().min(6)];
        info[..extra.len()].copy_from_slice(extra);
        Ok(SessionStatusInfo {
            status: SessionStatus(payload[0]),
            qualifier: payload[1],
            info,
        })
    }
}

/// Checksum computed by the slave (BUILD_CHKSUM).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    /// Checksum bytes, most significant first.
    pub bytes: Vec<u8>,
}

impl Checksum {
    /// The checksum as an integer, if it fits in 32 bits.
    pub fn value(&self) -> Option<u32> {
        if self.bytes.len() > 4 {
            return None;
        }
        Some(self.bytes.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
    }
}

impl DecodeResponse for Checksum {
    fn decode(payload: &[u8]) -> Result<Self, ProtocolError> {
        require(CommandCode::BuildChksum, payload, 1)?;
        let size = payload[0] as usize;
        require(CommandCode::BuildChksum, payload, 1 + size)?;
        Ok(Checksum {
            bytes: payload[1..1 + size].to_vec(),
        })
    }
}

/// Data returned by UPLOAD or SHORT_UP; the requested size is applied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadData(pub Vec<u8>);

impl UploadData {
    /// Take the first `size` bytes of a response payload.
    pub fn from_payload(payload: &[u8], size: u8) -> Result<Self, ProtocolError> {
        require(CommandCode::Upload, payload, size as usize)?;
        Ok(UploadData(payload[..size as usize].to_vec()))
    }
}
