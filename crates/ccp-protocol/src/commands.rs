//! Commands that can be sent to a CCP slave.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ProtocolError;
use crate::field::{fields, PayloadWriter};
use crate::types::*;

/// Command codes of the CCP 2.1 command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandCode {
    Connect,
    GetCcpVersion,
    ExchangeId,
    SetMta,
    Dnload,
    #[serde(rename = "DNLOAD_6")]
    Dnload6,
    Upload,
    ShortUp,
    GetDaqSize,
    SetDaqPtr,
    WriteDaq,
    StartStop,
    StartStopAll,
    Disconnect,
    Test,
    SetSStatus,
    GetSStatus,
    BuildChksum,
    ClearMemory,
    Program,
    #[serde(rename = "PROGRAM_6")]
    Program6,
    Move,
    GetActiveCalPage,
    SelectCalPage,
    Unlock,
    GetSeed,
}

impl CommandCode {
    /// Every command code, in declaration order.
    pub const ALL: [CommandCode; 26] = [
        CommandCode::Connect,
        CommandCode::GetCcpVersion,
        CommandCode::ExchangeId,
        CommandCode::SetMta,
        CommandCode::Dnload,
        CommandCode::Dnload6,
        CommandCode::Upload,
        CommandCode::ShortUp,
        CommandCode::GetDaqSize,
        CommandCode::SetDaqPtr,
        CommandCode::WriteDaq,
        CommandCode::StartStop,
        CommandCode::StartStopAll,
        CommandCode::Disconnect,
        CommandCode::Test,
        CommandCode::SetSStatus,
        CommandCode::GetSStatus,
        CommandCode::BuildChksum,
        CommandCode::ClearMemory,
        CommandCode::Program,
        CommandCode::Program6,
        CommandCode::Move,
        CommandCode::GetActiveCalPage,
        CommandCode::SelectCalPage,
        CommandCode::Unlock,
        CommandCode::GetSeed,
    ];

    /// Protocol mnemonic, e.g. `"SET_MTA"`.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            CommandCode::Connect => "CONNECT",
            CommandCode::GetCcpVersion => "GET_CCP_VERSION",
            CommandCode::ExchangeId => "EXCHANGE_ID",
            CommandCode::SetMta => "SET_MTA",
            CommandCode::Dnload => "DNLOAD",
            CommandCode::Dnload6 => "DNLOAD_6",
            CommandCode::Upload => "UPLOAD",
            CommandCode::ShortUp => "SHORT_UP",
            CommandCode::GetDaqSize => "GET_DAQ_SIZE",
            CommandCode::SetDaqPtr => "SET_DAQ_PTR",
            CommandCode::WriteDaq => "WRITE_DAQ",
            CommandCode::StartStop => "START_STOP",
            CommandCode::StartStopAll => "START_STOP_ALL",
            CommandCode::Disconnect => "DISCONNECT",
            CommandCode::Test => "TEST",
            CommandCode::SetSStatus => "SET_S_STATUS",
            CommandCode::GetSStatus => "GET_S_STATUS",
            CommandCode::BuildChksum => "BUILD_CHKSUM",
            CommandCode::ClearMemory => "CLEAR_MEMORY",
            CommandCode::Program => "PROGRAM",
            CommandCode::Program6 => "PROGRAM_6",
            CommandCode::Move => "MOVE",
            CommandCode::GetActiveCalPage => "GET_ACTIVE_CAL_PAGE",
            CommandCode::SelectCalPage => "SELECT_CAL_PAGE",
            CommandCode::Unlock => "UNLOCK",
            CommandCode::GetSeed => "GET_SEED",
        }
    }

    /// Maximum time to wait for the slave's response, in milliseconds.
    pub const fn timeout_ms(self) -> u64 {
        match self {
            CommandCode::BuildChksum | CommandCode::ClearMemory | CommandCode::Move => {
                TIMEOUT_LONG_MS
            }
            CommandCode::Program | CommandCode::Program6 => TIMEOUT_PROGRAM_MS,
            _ => TIMEOUT_DEFAULT_MS,
        }
    }

    /// Maximum time to wait for the slave's response.
    pub const fn timeout(self) -> Duration {
        Duration::from_millis(self.timeout_ms())
    }
}

impl std::fmt::Display for CommandCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl From<CommandCode> for u8 {
    fn from(code: CommandCode) -> Self {
        match code {
            CommandCode::Connect => CMD_CONNECT,
            CommandCode::GetCcpVersion => CMD_GET_CCP_VERSION,
            CommandCode::ExchangeId => CMD_EXCHANGE_ID,
            CommandCode::SetMta => CMD_SET_MTA,
            CommandCode::Dnload => CMD_DNLOAD,
            CommandCode::Dnload6 => CMD_DNLOAD_6,
            CommandCode::Upload => CMD_UPLOAD,
            CommandCode::ShortUp => CMD_SHORT_UP,
            CommandCode::GetDaqSize => CMD_GET_DAQ_SIZE,
            CommandCode::SetDaqPtr => CMD_SET_DAQ_PTR,
            CommandCode::WriteDaq => CMD_WRITE_DAQ,
            CommandCode::StartStop => CMD_START_STOP,
            CommandCode::StartStopAll => CMD_START_STOP_ALL,
            CommandCode::Disconnect => CMD_DISCONNECT,
            CommandCode::Test => CMD_TEST,
            CommandCode::SetSStatus => CMD_SET_S_STATUS,
            CommandCode::GetSStatus => CMD_GET_S_STATUS,
            CommandCode::BuildChksum => CMD_BUILD_CHKSUM,
            CommandCode::ClearMemory => CMD_CLEAR_MEMORY,
            CommandCode::Program => CMD_PROGRAM,
            CommandCode::Program6 => CMD_PROGRAM_6,
            CommandCode::Move => CMD_MOVE,
            CommandCode::GetActiveCalPage => CMD_GET_ACTIVE_CAL_PAGE,
            CommandCode::SelectCalPage => CMD_SELECT_CAL_PAGE,
            CommandCode::Unlock => CMD_UNLOCK,
            CommandCode::GetSeed => CMD_GET_SEED,
        }
    }
}

impl TryFrom<u8> for CommandCode {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CommandCode::ALL
            .iter()
            .copied()
            .find(|code| u8::from(*code) == value)
            .ok_or(ProtocolError::UnknownCommand(value))
    }
}

/// A command with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to the slave with the given station address.
    Connect {
        /// Station address.
        station_address: u16,
    },

    /// Announce the protocol version the master implements.
    GetCcpVersion {
        /// Main protocol version.
        major: u8,
        /// Release within the version.
        minor: u8,
    },

    /// Exchange station identifiers.
    ExchangeId {
        /// Master identification bytes (slave specific meaning).
        master_id: [u8; 6],
    },

    /// Set a memory transfer address.
    SetMta {
        /// Which pointer to set.
        slot: MtaSlot,
        /// Address extension.
        extension: u8,
        /// Address.
        address: u32,
    },

    /// Download up to 5 bytes at MTA0.
    Dnload {
        /// Data; its length is the size field.
        data: Vec<u8>,
    },

    /// Download exactly 6 bytes at MTA0.
    Dnload6 {
        /// Data.
        data: [u8; 6],
    },

    /// Upload `size` bytes from MTA0.
    Upload {
        /// Number of bytes.
        size: u8,
    },

    /// Upload from an explicit address without touching MTA0.
    ShortUp {
        /// Number of bytes.
        size: u8,
        /// Address extension.
        extension: u8,
        /// Address.
        address: u32,
    },

    /// Query the size of a DAQ list and assign its DTO identifier.
    GetDaqSize {
        /// DAQ list number.
        daq_list: u8,
        /// CAN identifier of the DTO the list will use.
        dto_id: u32,
    },

    /// Set the DAQ list pointer.
    SetDaqPtr(DaqPointer),

    /// Write one element at the DAQ list pointer.
    WriteDaq {
        /// Element size in bytes (1, 2 or 4).
        element_size: u8,
        /// Address extension.
        extension: u8,
        /// Address.
        address: u32,
    },

    /// Start, stop or prepare a DAQ list.
    StartStop(DaqListControl),

    /// Start or stop every prepared DAQ list.
    StartStopAll {
        /// `true` to start, `false` to stop.
        start: bool,
    },

    /// Disconnect from the slave.
    Disconnect {
        /// Temporary or end of session.
        mode: DisconnectMode,
        /// Station address.
        station_address: u16,
    },

    /// Probe for a slave station without connecting.
    Test {
        /// Station address.
        station_address: u16,
    },

    /// Write the session status.
    SetSStatus {
        /// Status bits.
        status: SessionStatus,
    },

    /// Read the session status.
    GetSStatus,

    /// Build a checksum over `block_size` bytes from MTA0.
    BuildChksum {
        /// Block size in bytes.
        block_size: u32,
    },

    /// Erase `size` bytes of non-volatile memory from MTA0.
    ClearMemory {
        /// Block size in bytes.
        size: u32,
    },

    /// Program up to 5 bytes at MTA0.
    Program {
        /// Data; its length is the size field.
        data: Vec<u8>,
    },

    /// Program exactly 6 bytes at MTA0.
    Program6 {
        /// Data.
        data: [u8; 6],
    },

    /// Copy `size` bytes from MTA0 to MTA1.
    Move {
        /// Block size in bytes.
        size: u32,
    },

    /// Read the start of the active calibration page.
    GetActiveCalPage,

    /// Activate the calibration page addressed by MTA0.
    SelectCalPage,

    /// Unlock a protected resource.
    Unlock {
        /// Key computed from the seed.
        key: Vec<u8>,
    },

    /// Request the seed for a protected resource.
    GetSeed {
        /// Resource to unlock.
        resource: ResourceMask,
    },
}

impl Command {
    /// The command code.
    pub fn code(&self) -> CommandCode {
        match self {
            Command::Connect { .. } => CommandCode::Connect,
            Command::GetCcpVersion { .. } => CommandCode::GetCcpVersion,
            Command::ExchangeId { .. } => CommandCode::ExchangeId,
            Command::SetMta { .. } => CommandCode::SetMta,
            Command::Dnload { .. } => CommandCode::Dnload,
            Command::Dnload6 { .. } => CommandCode::Dnload6,
            Command::Upload { .. } => CommandCode::Upload,
            Command::ShortUp { .. } => CommandCode::ShortUp,
            Command::GetDaqSize { .. } => CommandCode::GetDaqSize,
            Command::SetDaqPtr(_) => CommandCode::SetDaqPtr,
            Command::WriteDaq { .. } => CommandCode::WriteDaq,
            Command::StartStop(_) => CommandCode::StartStop,
            Command::StartStopAll { .. } => CommandCode::StartStopAll,
            Command::Disconnect { .. } => CommandCode::Disconnect,
            Command::Test { .. } => CommandCode::Test,
            Command::SetSStatus { .. } => CommandCode::SetSStatus,
            Command::GetSStatus => CommandCode::GetSStatus,
            Command::BuildChksum { .. } => CommandCode::BuildChksum,
            Command::ClearMemory { .. } => CommandCode::ClearMemory,
            Command::Program { .. } => CommandCode::Program,
            Command::Program6 { .. } => CommandCode::Program6,
            Command::Move { .. } => CommandCode::Move,
            Command::GetActiveCalPage => CommandCode::GetActiveCalPage,
            Command::SelectCalPage => CommandCode::SelectCalPage,
            Command::Unlock { .. } => CommandCode::Unlock,
            Command::GetSeed { .. } => CommandCode::GetSeed,
        }
    }

    /// Encode the bytes that follow the opcode and counter.
    ///
    /// Never returns more than 6 bytes; arguments that cannot be encoded are
    /// reported as [`ProtocolError::PayloadTooLarge`] or
    /// [`ProtocolError::InvalidArgument`].
    pub fn encode_payload(&self) -> Result<Vec<u8>, ProtocolError> {
        let w = PayloadWriter::new();
        let mnemonic = self.code().mnemonic();

        let w = match self {
            Command::Connect { station_address } | Command::Test { station_address } => {
                w.field(fields::STATION_ADDRESS, *station_address as u32)?
            }

            Command::GetCcpVersion { major, minor } => w.u8(*major).u8(*minor),

            Command::ExchangeId { master_id } => w.bytes(master_id),

            Command::SetMta { slot, extension, address } => w
                .u8((*slot).into())
                .u8(*extension)
                .field(fields::SET_MTA_ADDRESS, *address)?,

            Command::Dnload { data } | Command::Program { data } => {
                if data.len() > MAX_SIZED_DATA {
                    return Err(ProtocolError::PayloadTooLarge {
                        max: MAX_PAYLOAD_SIZE,
                        actual: data.len() + 1,
                    });
                }
                w.u8(data.len() as u8).bytes(data)
            }

            Command::Dnload6 { data } | Command::Program6 { data } => w.bytes(data),

            Command::Upload { size } => {
                check_upload_size(mnemonic, *size)?;
                w.u8(*size)
            }

            Command::ShortUp { size, extension, address } => {
                check_upload_size(mnemonic, *size)?;
                w.u8(*size)
                    .u8(*extension)
                    .field(fields::SHORT_UP_ADDRESS, *address)?
            }

            Command::GetDaqSize { daq_list, dto_id } => w
                .u8(*daq_list)
                .u8(0x00)
                .field(fields::DAQ_SIZE_ADDRESS, *dto_id)?,

            Command::SetDaqPtr(ptr) => w.u8(ptr.daq_list).u8(ptr.odt).u8(ptr.element),

            Command::WriteDaq { element_size, extension, address } => {
                if !matches!(element_size, 1 | 2 | 4) {
                    return Err(ProtocolError::invalid_argument(
                        mnemonic,
                        format!("element size {} is not 1, 2 or 4", element_size),
                    ));
                }
                w.u8(*element_size)
                    .u8(*extension)
                    .field(fields::WRITE_DAQ_ADDRESS, *address)?
            }

            Command::StartStop(ctl) => w
                .u8(ctl.mode.into())
                .u8(ctl.daq_list)
                .u8(ctl.last_odt)
                .u8(ctl.event_channel)
                .field(fields::RATE_PRESCALER, ctl.prescaler as u32)?,

            Command::StartStopAll { start } => w.u8(if *start { 0x01 } else { 0x00 }),

            Command::Disconnect { mode, station_address } => w
                .u8((*mode).into())
                .u8(0x00)
                .field(fields::STATION_ADDRESS, *station_address as u32)?,

            Command::SetSStatus { status } => w.u8(status.bits()),

            Command::GetSStatus | Command::GetActiveCalPage | Command::SelectCalPage => w,

            Command::BuildChksum { block_size } => {
                w.field(fields::CHECKSUM_BLOCK_SIZE, *block_size)?
            }

            Command::ClearMemory { size } => w.field(fields::CLEAR_MEMORY_SIZE, *size)?,

            Command::Move { size } => w.field(fields::MOVE_SIZE, *size)?,

            Command::Unlock { key } => {
                if key.is_empty() {
                    return Err(ProtocolError::invalid_argument(mnemonic, "empty key"));
                }
                w.bytes(key)
            }

            Command::GetSeed { resource } => w.u8(resource.bits()),
        };

        w.finish()
    }
}

fn check_upload_size(command: &'static str, size: u8) -> Result<(), ProtocolError> {
    if size == 0 || size > MAX_UPLOAD_SIZE {
        return Err(ProtocolError::invalid_argument(
            command,
            format!("size {} outside 1..={}", size, MAX_UPLOAD_SIZE),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(cmd: Command) -> Vec<u8> {
        cmd.encode_payload().expect("payload should encode")
    }

    #[test]
    fn test_command_code_round_trip() {
        for code in CommandCode::ALL {
            assert_eq!(CommandCode::try_from(u8::from(code)).unwrap(), code);
        }
        assert_eq!(
            CommandCode::try_from(0x20).unwrap_err(),
            ProtocolError::UnknownCommand(0x20)
        );
    }

    #[test]
    fn test_command_codes_are_distinct() {
        let mut bytes: Vec<u8> = CommandCode::ALL.iter().map(|c| u8::from(*c)).collect();
        bytes.sort_unstable();
        bytes.dedup();
        assert_eq!(bytes.len(), CommandCode::ALL.len());
    }

    #[test]
    fn test_command_code_serde_names() {
        let yaml = serde_yaml::to_string(&vec![CommandCode::BuildChksum, CommandCode::Dnload6]).unwrap();
        assert_eq!(yaml, "- BUILD_CHKSUM\n- DNLOAD_6\n");
        for code in CommandCode::ALL {
            let parsed: CommandCode = serde_yaml::from_str(code.mnemonic()).unwrap();
            assert_eq!(parsed, code);
        }
    }

    #[test]
    fn test_timeout_table() {
        assert_eq!(CommandCode::Connect.timeout(), Duration::from_millis(25));
        assert_eq!(CommandCode::BuildChksum.timeout(), Duration::from_secs(30));
        assert_eq!(CommandCode::ClearMemory.timeout(), Duration::from_secs(30));
        assert_eq!(CommandCode::Move.timeout(), Duration::from_secs(30));
        assert_eq!(CommandCode::Program6.timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_connect_is_little_endian() {
        assert_eq!(payload(Command::Connect { station_address: 0x0201 }), vec![0x01, 0x02]);
    }

    #[test]
    fn test_set_mta_payload() {
        let cmd = Command::SetMta { slot: MtaSlot::Mta0, extension: 0, address: 0x1234_5678 };
        assert_eq!(payload(cmd), vec![0x00, 0x00, 0x78, 0x56, 0x34, 0x12]);

        let cmd = Command::SetMta { slot: MtaSlot::Mta1, extension: 3, address: 0x1234_5678 };
        assert_eq!(payload(cmd), vec![0x01, 0x03, 0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_get_daq_size_payload() {
        let cmd = Command::GetDaqSize { daq_list: 1, dto_id: 0x1234_5678 };
        assert_eq!(payload(cmd), vec![1, 0x00, 0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_write_daq_payload() {
        let cmd = Command::WriteDaq { element_size: 2, extension: 0, address: 0xA000_0010 };
        assert_eq!(payload(cmd), vec![2, 0, 0xA0, 0x00, 0x00, 0x10]);

        let err = Command::WriteDaq { element_size: 3, extension: 0, address: 0 }
            .encode_payload()
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArgument { .. }));
    }

    #[test]
    fn test_start_stop_payload() {
        let cmd = Command::StartStop(DaqListControl {
            mode: StartStopMode::Start,
            daq_list: 0,
            last_odt: 3,
            event_channel: 2,
            prescaler: 0x0102,
        });
        assert_eq!(payload(cmd), vec![0x01, 0x00, 0x03, 0x02, 0x01, 0x02]);
        assert_eq!(payload(Command::StartStopAll { start: true }), vec![0x01]);
    }

    #[test]
    fn test_disconnect_payload() {
        let cmd = Command::Disconnect {
            mode: DisconnectMode::EndOfSession,
            station_address: 0x3344,
        };
        assert_eq!(payload(cmd), vec![DISCONNECT_END_OF_SESSION, 0x00, 0x44, 0x33]);
    }

    #[test]
    fn test_build_chksum_is_little_endian() {
        let cmd = Command::BuildChksum { block_size: 0x0000_1000 };
        assert_eq!(payload(cmd), vec![0x00, 0x10, 0x00, 0x00]);
    }

    #[test]
    fn test_memory_commands_are_big_endian() {
        assert_eq!(payload(Command::ClearMemory { size: 0x0001_0000 }), vec![0, 1, 0, 0]);
        assert_eq!(payload(Command::Move { size: 0x10 }), vec![0, 0, 0, 0x10]);
        let cmd = Command::ShortUp { size: 4, extension: 1, address: 0x0000_2000 };
        assert_eq!(payload(cmd), vec![4, 1, 0x00, 0x00, 0x20, 0x00]);
    }

    #[test]
    fn test_sized_data_commands() {
        assert_eq!(payload(Command::Dnload { data: vec![9, 8, 7] }), vec![3, 9, 8, 7]);
        assert_eq!(payload(Command::Program { data: vec![1; 5] }), vec![5, 1, 1, 1, 1, 1]);
        assert_eq!(payload(Command::Dnload6 { data: [1, 2, 3, 4, 5, 6] }), vec![1, 2, 3, 4, 5, 6]);

        let err = Command::Dnload { data: vec![0; 6] }.encode_payload().unwrap_err();
        assert_eq!(err, ProtocolError::PayloadTooLarge { max: 6, actual: 7 });
    }

    #[test]
    fn test_upload_size_limits() {
        assert_eq!(payload(Command::Upload { size: 6 }), vec![6]);
        assert!(Command::Upload { size: 0 }.encode_payload().is_err());
        assert!(Command::Upload { size: 7 }.encode_payload().is_err());
    }

    #[test]
    fn test_seed_and_key() {
        assert_eq!(payload(Command::GetSeed { resource: ResourceMask::PGM }), vec![0x40]);
        assert_eq!(payload(Command::Unlock { key: vec![0xDE, 0xAD, 0xBE, 0xEF] }), vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(Command::Unlock { key: vec![] }.encode_payload().is_err());
        assert!(matches!(
            Command::Unlock { key: vec![0; 7] }.encode_payload(),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_parameterless_commands() {
        assert!(payload(Command::GetSStatus).is_empty());
        assert!(payload(Command::GetActiveCalPage).is_empty());
        assert!(payload(Command::SelectCalPage).is_empty());
        assert_eq!(payload(Command::SetSStatus { status: SessionStatus::CAL | SessionStatus::RUN }), vec![0x81]);
        assert_eq!(payload(Command::Test { station_address: 0x1234 }), vec![0x34, 0x12]);
    }

    #[test]
    fn test_every_code_is_reachable_from_a_command() {
        let commands = vec![
            Command::Connect { station_address: 0 },
            Command::GetCcpVersion { major: CCP_VERSION_MAJOR, minor: CCP_VERSION_MINOR },
            Command::ExchangeId { master_id: [0; 6] },
            Command::SetMta { slot: MtaSlot::Mta0, extension: 0, address: 0 },
            Command::Dnload { data: vec![0] },
            Command::Dnload6 { data: [0; 6] },
            Command::Upload { size: 1 },
            Command::ShortUp { size: 1, extension: 0, address: 0 },
            Command::GetDaqSize { daq_list: 0, dto_id: 0 },
            Command::SetDaqPtr(DaqPointer::new(0, 0, 0)),
            Command::WriteDaq { element_size: 1, extension: 0, address: 0 },
            Command::StartStop(DaqListControl {
                mode: StartStopMode::Stop,
                daq_list: 0,
                last_odt: 0,
                event_channel: 0,
                prescaler: 1,
            }),
            Command::StartStopAll { start: false },
            Command::Disconnect { mode: DisconnectMode::Temporary, station_address: 0 },
            Command::Test { station_address: 0 },
            Command::SetSStatus { status: SessionStatus::default() },
            Command::GetSStatus,
            Command::BuildChksum { block_size: 0 },
            Command::ClearMemory { size: 0 },
            Command::Program { data: vec![0] },
            Command::Program6 { data: [0; 6] },
            Command::Move { size: 0 },
            Command::GetActiveCalPage,
            Command::SelectCalPage,
            Command::Unlock { key: vec![0] },
            Command::GetSeed { resource: ResourceMask::CAL },
        ];
        let codes: Vec<CommandCode> = commands.iter().map(Command::code).collect();
        assert_eq!(codes, CommandCode::ALL.to_vec());
        for cmd in &commands {
            assert!(cmd.encode_payload().unwrap().len() <= MAX_PAYLOAD_SIZE);
        }
    }
}
