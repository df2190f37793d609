//! Common types used in the protocol.

use crate::constants::*;

/// Memory transfer address slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MtaSlot {
    /// Primary pointer used by DNLOAD, UPLOAD, PROGRAM, BUILD_CHKSUM and as MOVE source.
    Mta0 = 0,
    /// Secondary pointer, the MOVE destination.
    Mta1 = 1,
}

impl MtaSlot {
    /// Index into a per-connection pointer table.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<MtaSlot> for u8 {
    fn from(slot: MtaSlot) -> Self {
        slot as u8
    }
}

/// A memory location on the slave: 32-bit address plus extension byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MemoryAddress {
    /// Address extension (segment, page, bank; slave specific).
    pub extension: u8,
    /// 32-bit address.
    pub address: u32,
}

impl MemoryAddress {
    /// Create a new memory address.
    pub fn new(extension: u8, address: u32) -> Self {
        MemoryAddress { extension, address }
    }
}

impl std::fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:0x{:08X}", self.extension, self.address)
    }
}

/// DISCONNECT type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectMode {
    /// The slave keeps its session and can be reconnected.
    Temporary,
    /// End of session; the slave discards calibration state.
    EndOfSession,
}

impl From<DisconnectMode> for u8 {
    fn from(mode: DisconnectMode) -> Self {
        match mode {
            DisconnectMode::Temporary => DISCONNECT_TEMPORARY,
            DisconnectMode::EndOfSession => DISCONNECT_END_OF_SESSION,
        }
    }
}

/// START_STOP mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartStopMode {
    /// Stop the DAQ list.
    Stop,
    /// Start the DAQ list.
    Start,
    /// Prepare the list for a synchronized START_STOP_ALL.
    Prepare,
}

impl From<StartStopMode> for u8 {
    fn from(mode: StartStopMode) -> Self {
        match mode {
            StartStopMode::Stop => START_STOP_STOP,
            StartStopMode::Start => START_STOP_START,
            StartStopMode::Prepare => START_STOP_PREPARE,
        }
    }
}

/// Set of protected slave resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceMask(pub u8);

impl ResourceMask {
    /// No resource.
    pub const NONE: ResourceMask = ResourceMask(0);
    /// Calibration.
    pub const CAL: ResourceMask = ResourceMask(RESOURCE_CAL);
    /// Data acquisition.
    pub const DAQ: ResourceMask = ResourceMask(RESOURCE_DAQ);
    /// Memory programming.
    pub const PGM: ResourceMask = ResourceMask(RESOURCE_PGM);

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every resource in `other` is in `self`.
    pub fn contains(self, other: ResourceMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no resource is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ResourceMask {
    type Output = ResourceMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ResourceMask(self.0 | rhs.0)
    }
}

/// Session status bits (SET_S_STATUS / GET_S_STATUS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SessionStatus(pub u8);

impl SessionStatus {
    /// Calibration data initialized.
    pub const CAL: SessionStatus = SessionStatus(SESSION_CAL);
    /// DAQ lists initialized.
    pub const DAQ: SessionStatus = SessionStatus(SESSION_DAQ);
    /// Resume DAQ after power-up.
    pub const RESUME: SessionStatus = SessionStatus(SESSION_RESUME);
    /// Store calibration data.
    pub const STORE: SessionStatus = SessionStatus(SESSION_STORE);
    /// Session in progress.
    pub const RUN: SessionStatus = SessionStatus(SESSION_RUN);

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit in `other` is set.
    pub fn contains(self, other: SessionStatus) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SessionStatus {
    type Output = SessionStatus;

    fn bitor(self, rhs: Self) -> Self::Output {
        SessionStatus(self.0 | rhs.0)
    }
}

/// Position inside the DAQ list configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DaqPointer {
    /// DAQ list number.
    pub daq_list: u8,
    /// Object descriptor table within the list.
    pub odt: u8,
    /// Element within the ODT.
    pub element: u8,
}

impl DaqPointer {
    /// Create a new DAQ pointer.
    pub fn new(daq_list: u8, odt: u8, element: u8) -> Self {
        DaqPointer { daq_list, odt, element }
    }
}

/// Parameters of a START_STOP command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaqListControl {
    /// Start, stop or prepare.
    pub mode: StartStopMode,
    /// DAQ list number.
    pub daq_list: u8,
    /// Last ODT to transmit.
    pub last_odt: u8,
    /// Event channel triggering the list.
    pub event_channel: u8,
    /// Transmission rate prescaler.
    pub prescaler: u16,
}
