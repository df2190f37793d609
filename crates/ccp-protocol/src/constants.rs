//! Protocol constants
//!
//! These constants define the command codes, return codes, and other
//! protocol-specific values of CCP version 2.1.

// ============================================================================
// Frame Layout
// ============================================================================

/// Size of every command (CRO) and response (DTO) frame in bytes.
pub const FRAME_SIZE: usize = 8;
/// Maximum command payload after the opcode and counter bytes.
pub const MAX_PAYLOAD_SIZE: usize = FRAME_SIZE - 2;
/// Byte offset of the payload inside a frame.
pub const PAYLOAD_OFFSET: usize = 2;

/// Protocol version announced by the master in GET_CCP_VERSION.
pub const CCP_VERSION_MAJOR: u8 = 2;
/// Protocol release announced by the master in GET_CCP_VERSION.
pub const CCP_VERSION_MINOR: u8 = 1;

// ============================================================================
// Command Codes (master → slave)
// ============================================================================

// Mandatory commands.

/// Establish a logical connection with a slave station.
pub const CMD_CONNECT: u8 = 0x01;
/// Negotiate the protocol version.
pub const CMD_GET_CCP_VERSION: u8 = 0x1B;
/// Exchange station identifiers.
pub const CMD_EXCHANGE_ID: u8 = 0x17;
/// Set a memory transfer address.
pub const CMD_SET_MTA: u8 = 0x02;
/// Download up to 5 bytes at MTA0.
pub const CMD_DNLOAD: u8 = 0x03;
/// Upload bytes from MTA0.
pub const CMD_UPLOAD: u8 = 0x04;
/// Query the size of a DAQ list.
pub const CMD_GET_DAQ_SIZE: u8 = 0x14;
/// Set the DAQ list / ODT / element pointer.
pub const CMD_SET_DAQ_PTR: u8 = 0x15;
/// Write an element into the current DAQ pointer.
pub const CMD_WRITE_DAQ: u8 = 0x16;
/// Start, stop or prepare a single DAQ list.
pub const CMD_START_STOP: u8 = 0x06;
/// Disconnect from a slave station.
pub const CMD_DISCONNECT: u8 = 0x07;

// Optional commands.

/// Request a seed for a protected resource.
pub const CMD_GET_SEED: u8 = 0x12;
/// Unlock a protected resource with a key.
pub const CMD_UNLOCK: u8 = 0x13;
/// Download exactly 6 bytes at MTA0.
pub const CMD_DNLOAD_6: u8 = 0x23;
/// Upload from an explicit address without touching MTA0.
pub const CMD_SHORT_UP: u8 = 0x0F;
/// Select the calibration page addressed by MTA0.
pub const CMD_SELECT_CAL_PAGE: u8 = 0x11;
/// Set the session status bits.
pub const CMD_SET_S_STATUS: u8 = 0x0C;
/// Read the session status bits.
pub const CMD_GET_S_STATUS: u8 = 0x0D;
/// Build a checksum over a memory block starting at MTA0.
pub const CMD_BUILD_CHKSUM: u8 = 0x0E;
/// Erase non-volatile memory starting at MTA0.
pub const CMD_CLEAR_MEMORY: u8 = 0x10;
/// Program up to 5 bytes at MTA0.
pub const CMD_PROGRAM: u8 = 0x18;
/// Program exactly 6 bytes at MTA0.
pub const CMD_PROGRAM_6: u8 = 0x22;
/// Move a memory block from MTA0 to MTA1.
pub const CMD_MOVE: u8 = 0x19;
/// Test whether a slave station is present.
pub const CMD_TEST: u8 = 0x05;
/// Read the start address of the active calibration page.
pub const CMD_GET_ACTIVE_CAL_PAGE: u8 = 0x09;
/// Start or stop all prepared DAQ lists.
pub const CMD_START_STOP_ALL: u8 = 0x08;

// ============================================================================
// Return Codes (slave → master)
// ============================================================================

/// Command acknowledged, no error.
pub const RET_ACKNOWLEDGE: u8 = 0x00;
/// DAQ processor overload (C0, warning).
pub const RET_DAQ_PROCESSOR_OVERLOAD: u8 = 0x01;
/// Command processor busy (C1, wait until ACK or timeout).
pub const RET_COMMAND_PROCESSOR_BUSY: u8 = 0x10;
/// DAQ processor busy (C1).
pub const RET_DAQ_PROCESSOR_BUSY: u8 = 0x11;
/// Internal timeout (C1).
pub const RET_INTERNAL_TIMEOUT: u8 = 0x12;
/// Key request (C1, embedded seed and key).
pub const RET_KEY_REQUEST: u8 = 0x18;
/// Session status request (C1, embedded SET_S_STATUS).
pub const RET_SESSION_STATUS_REQUEST: u8 = 0x19;
/// Cold start request (C2).
pub const RET_COLD_START_REQUEST: u8 = 0x20;
/// Calibration data initialization request (C2).
pub const RET_CAL_DATA_INIT_REQUEST: u8 = 0x21;
/// DAQ list initialization request (C2).
pub const RET_DAQ_LIST_INIT_REQUEST: u8 = 0x22;
/// Code update request (C2).
pub const RET_CODE_UPDATE_REQUEST: u8 = 0x23;
/// Unknown command (C3, fault).
pub const RET_UNKNOWN_COMMAND: u8 = 0x30;
/// Command syntax error (C3).
pub const RET_COMMAND_SYNTAX: u8 = 0x31;
/// Parameter out of range (C3).
pub const RET_PARAMETER_OUT_OF_RANGE: u8 = 0x32;
/// Access denied (C3).
pub const RET_ACCESS_DENIED: u8 = 0x33;
/// Overload (C3).
pub const RET_OVERLOAD: u8 = 0x34;
/// Access locked (C3).
pub const RET_ACCESS_LOCKED: u8 = 0x35;
/// Resource or function not available (C3).
pub const RET_RESOURCE_FUNCTION_NOT_AVAILABLE: u8 = 0x36;

// ============================================================================
// Resource and Session Bits
// ============================================================================

/// Calibration resource.
pub const RESOURCE_CAL: u8 = 1 << 0;
/// Data acquisition resource.
pub const RESOURCE_DAQ: u8 = 1 << 1;
/// Memory programming resource.
pub const RESOURCE_PGM: u8 = 1 << 6;

/// Calibration data initialized.
pub const SESSION_CAL: u8 = 0x01;
/// DAQ list(s) initialized.
pub const SESSION_DAQ: u8 = 0x02;
/// Resume DAQ after power-up.
pub const SESSION_RESUME: u8 = 0x04;
/// Store calibration data to non-volatile memory.
pub const SESSION_STORE: u8 = 0x40;
/// Session in progress.
pub const SESSION_RUN: u8 = 0x80;

// ============================================================================
// Command Parameters
// ============================================================================

/// DISCONNECT: temporary, the slave keeps the session.
pub const DISCONNECT_TEMPORARY: u8 = 0x00;
/// DISCONNECT: end of session, the slave discards calibration state.
pub const DISCONNECT_END_OF_SESSION: u8 = 0x01;

/// START_STOP: stop the DAQ list.
pub const START_STOP_STOP: u8 = 0x00;
/// START_STOP: start the DAQ list.
pub const START_STOP_START: u8 = 0x01;
/// START_STOP: prepare for a later START_STOP_ALL.
pub const START_STOP_PREPARE: u8 = 0x02;

/// Maximum data bytes in DNLOAD / PROGRAM (one byte is the size field).
pub const MAX_SIZED_DATA: usize = MAX_PAYLOAD_SIZE - 1;
/// Maximum bytes returned by UPLOAD / SHORT_UP.
pub const MAX_UPLOAD_SIZE: u8 = MAX_PAYLOAD_SIZE as u8;

// ============================================================================
// Timeouts (milliseconds)
// ============================================================================

/// Default response window for most commands.
pub const TIMEOUT_DEFAULT_MS: u64 = 25;
/// Response window for PROGRAM / PROGRAM_6.
pub const TIMEOUT_PROGRAM_MS: u64 = 100;
/// Response window for long-running memory operations.
pub const TIMEOUT_LONG_MS: u64 = 30_000;
