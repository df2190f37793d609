//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when encoding or decoding CCP frames.
///
/// All of these are caller or framing faults; none of them is ever sent on
/// the bus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command payload does not fit after the opcode and counter bytes.
    #[error("payload too large: maximum {max} bytes, got {actual}")]
    PayloadTooLarge {
        /// Maximum allowed length.
        max: usize,
        /// Actual length requested.
        actual: usize,
    },

    /// Frame is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Frame is longer than a classic CAN payload.
    #[error("frame too long: maximum {max} bytes, got {actual}")]
    FrameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Unknown command code.
    #[error("unknown command code: 0x{0:02X}")]
    UnknownCommand(u8),

    /// A command argument is outside the range the protocol allows.
    #[error("invalid argument for {command}: {reason}")]
    InvalidArgument {
        /// Command mnemonic.
        command: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// Response payload does not carry the fields the command defines.
    #[error("response to {command} too short: expected {expected} bytes, got {actual}")]
    ResponseTooShort {
        /// Command mnemonic.
        command: &'static str,
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },
}

impl ProtocolError {
    /// Create an invalid argument error.
    pub fn invalid_argument(command: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidArgument {
            command,
            reason: reason.into(),
        }
    }
}

/// Error category of a return code.
///
/// Categories drive the master's reaction: C0 is a warning, C1 asks to wait,
/// C2 asks for re-initialization, C3 is a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// C0: warning, no action required.
    Warning,
    /// C1: spurious, wait until ACK or timeout.
    Busy,
    /// C2: resolvable, re-initialize.
    Resolvable,
    /// C3: unresolvable, fault.
    Fault,
}

/// Return code carried in byte 0 of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    /// Command acknowledged.
    Acknowledge,
    /// DAQ processor overload.
    DaqProcessorOverload,
    /// Command processor busy.
    CommandProcessorBusy,
    /// DAQ processor busy.
    DaqProcessorBusy,
    /// Internal timeout.
    InternalTimeout,
    /// Key request.
    KeyRequest,
    /// Session status request.
    SessionStatusRequest,
    /// Cold start request.
    ColdStartRequest,
    /// Calibration data initialization request.
    CalDataInitRequest,
    /// DAQ list initialization request.
    DaqListInitRequest,
    /// Code update request.
    CodeUpdateRequest,
    /// Unknown command.
    UnknownCommand,
    /// Command syntax.
    CommandSyntax,
    /// Parameter out of range.
    ParameterOutOfRange,
    /// Access denied.
    AccessDenied,
    /// Overload.
    Overload,
    /// Access locked.
    AccessLocked,
    /// Resource or function not available.
    ResourceFunctionNotAvailable,
    /// Any code the table does not define.
    Unknown(u8),
}

impl ReturnCode {
    /// Whether this is a positive acknowledgement.
    pub fn is_ack(&self) -> bool {
        matches!(self, ReturnCode::Acknowledge)
    }

    /// Error category, or `None` for an acknowledgement.
    ///
    /// Undefined codes are treated as faults.
    pub fn category(&self) -> Option<ErrorCategory> {
        use ReturnCode::*;
        match self {
            Acknowledge => None,
            DaqProcessorOverload => Some(ErrorCategory::Warning),
            CommandProcessorBusy | DaqProcessorBusy | InternalTimeout | KeyRequest
            | SessionStatusRequest => Some(ErrorCategory::Busy),
            ColdStartRequest | CalDataInitRequest | DaqListInitRequest | CodeUpdateRequest => {
                Some(ErrorCategory::Resolvable)
            }
            UnknownCommand | CommandSyntax | ParameterOutOfRange | AccessDenied | Overload
            | AccessLocked | ResourceFunctionNotAvailable | Unknown(_) => {
                Some(ErrorCategory::Fault)
            }
        }
    }
}

impl std::fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnCode::Acknowledge => write!(f, "acknowledge"),
            ReturnCode::DaqProcessorOverload => write!(f, "DAQ processor overload"),
            ReturnCode::CommandProcessorBusy => write!(f, "command processor busy"),
            ReturnCode::DaqProcessorBusy => write!(f, "DAQ processor busy"),
            ReturnCode::InternalTimeout => write!(f, "internal timeout"),
            ReturnCode::KeyRequest => write!(f, "key request"),
            ReturnCode::SessionStatusRequest => write!(f, "session status request"),
            ReturnCode::ColdStartRequest => write!(f, "cold start request"),
            ReturnCode::CalDataInitRequest => write!(f, "calibration data init request"),
            ReturnCode::DaqListInitRequest => write!(f, "DAQ list init request"),
            ReturnCode::CodeUpdateRequest => write!(f, "code update request"),
            ReturnCode::UnknownCommand => write!(f, "unknown command"),
            ReturnCode::CommandSyntax => write!(f, "command syntax"),
            ReturnCode::ParameterOutOfRange => write!(f, "parameter out of range"),
            ReturnCode::AccessDenied => write!(f, "access denied"),
            ReturnCode::Overload => write!(f, "overload"),
            ReturnCode::AccessLocked => write!(f, "access locked"),
            ReturnCode::ResourceFunctionNotAvailable => {
                write!(f, "resource/function not available")
            }
            ReturnCode::Unknown(code) => write!(f, "unknown return code (0x{:02X})", code),
        }
    }
}

impl From<u8> for ReturnCode {
    fn from(code: u8) -> Self {
        use crate::constants::*;
        match code {
            RET_ACKNOWLEDGE => ReturnCode::Acknowledge,
            RET_DAQ_PROCESSOR_OVERLOAD => ReturnCode::DaqProcessorOverload,
            RET_COMMAND_PROCESSOR_BUSY => ReturnCode::CommandProcessorBusy,
            RET_DAQ_PROCESSOR_BUSY => ReturnCode::DaqProcessorBusy,
            RET_INTERNAL_TIMEOUT => ReturnCode::InternalTimeout,
            RET_KEY_REQUEST => ReturnCode::KeyRequest,
            RET_SESSION_STATUS_REQUEST => ReturnCode::SessionStatusRequest,
            RET_COLD_START_REQUEST => ReturnCode::ColdStartRequest,
            RET_CAL_DATA_INIT_REQUEST => ReturnCode::CalDataInitRequest,
            RET_DAQ_LIST_INIT_REQUEST => ReturnCode::DaqListInitRequest,
            RET_CODE_UPDATE_REQUEST => ReturnCode::CodeUpdateRequest,
            RET_UNKNOWN_COMMAND => ReturnCode::UnknownCommand,
            RET_COMMAND_SYNTAX => ReturnCode::CommandSyntax,
            RET_PARAMETER_OUT_OF_RANGE => ReturnCode::ParameterOutOfRange,
            RET_ACCESS_DENIED => ReturnCode::AccessDenied,
            RET_OVERLOAD => ReturnCode::Overload,
            RET_ACCESS_LOCKED => ReturnCode::AccessLocked,
            RET_RESOURCE_FUNCTION_NOT_AVAILABLE => ReturnCode::ResourceFunctionNotAvailable,
            _ => ReturnCode::Unknown(code),
        }
    }
}

impl From<ReturnCode> for u8 {
    fn from(code: ReturnCode) -> Self {
        use crate::constants::*;
        match code {
            ReturnCode::Acknowledge => RET_ACKNOWLEDGE,
            ReturnCode::DaqProcessorOverload => RET_DAQ_PROCESSOR_OVERLOAD,
            ReturnCode::CommandProcessorBusy => RET_COMMAND_PROCESSOR_BUSY,
            ReturnCode::DaqProcessorBusy => RET_DAQ_PROCESSOR_BUSY,
            ReturnCode::InternalTimeout => RET_INTERNAL_TIMEOUT,
            ReturnCode::KeyRequest => RET_KEY_REQUEST,
            ReturnCode::SessionStatusRequest => RET_SESSION_STATUS_REQUEST,
            ReturnCode::ColdStartRequest => RET_COLD_START_REQUEST,
            ReturnCode::CalDataInitRequest => RET_CAL_DATA_INIT_REQUEST,
            ReturnCode::DaqListInitRequest => RET_DAQ_LIST_INIT_REQUEST,
            ReturnCode::CodeUpdateRequest => RET_CODE_UPDATE_REQUEST,
            ReturnCode::UnknownCommand => RET_UNKNOWN_COMMAND,
            ReturnCode::CommandSyntax => RET_COMMAND_SYNTAX,
            ReturnCode::ParameterOutOfRange => RET_PARAMETER_OUT_OF_RANGE,
            ReturnCode::AccessDenied => RET_ACCESS_DENIED,
            ReturnCode::Overload => RET_OVERLOAD,
            ReturnCode::AccessLocked => RET_ACCESS_LOCKED,
            ReturnCode::ResourceFunctionNotAvailable => RET_RESOURCE_FUNCTION_NOT_AVAILABLE,
            ReturnCode::Unknown(code) => code,
        }
    }
}
