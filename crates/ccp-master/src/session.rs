//! An open session with one slave: the command catalog.
//!
//! Each method packs its arguments, runs one transaction and checks the
//! return code. Arguments that cannot be encoded fail before a counter is
//! taken, so nothing is sent.

use std::sync::Arc;

use ccp_metrics::{metric_defs, ConnectionLabels};
use ccp_protocol::{
    CcpVersion, Checksum, Command, DaqListControl, DaqPointer, DaqSize, DecodeResponse,
    DisconnectMode, MemoryAddress, MtaPosition, MtaSlot, ResourceMask, ResponseFrame, Seed,
    SessionStatus, SessionStatusInfo, SlaveId, UploadData,
};
use tracing::{debug, warn};

use crate::connection::{Connection, ConnectionState};
use crate::error::{CcpError, CcpResult};
use crate::transaction::TransactionEngine;
use crate::transport::Transport;

/// A session with one slave station.
///
/// The session owns its response identifier on the shared transport until it
/// is dropped.
pub struct Session<T: Transport> {
    engine: Arc<TransactionEngine<T>>,
    connection: Connection,
}

impl<T: Transport> Session<T> {
    pub(crate) fn open(engine: Arc<TransactionEngine<T>>, connection: Connection) -> CcpResult<Self> {
        engine.router().register(connection.dto_id())?;
        {
            let _entered = connection.span().enter();
            debug!(station = connection.station_address(), "session opened");
        }
        Ok(Session { engine, connection })
    }

    /// Connection identifiers and state.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Snapshot of the connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Most recent failure on this session.
    pub fn last_error(&self) -> Option<String> {
        self.connection.last_error()
    }

    /// Send any command and return the correlated response as received.
    ///
    /// The return code is not interpreted and no state is updated.
    pub fn execute(&self, command: &Command) -> CcpResult<ResponseFrame> {
        let result = command
            .encode_payload()
            .map_err(CcpError::from)
            .and_then(|payload| self.engine.execute(&self.connection, command.code(), &payload));
        self.record(result)
    }

    fn acknowledged(&self, command: &Command) -> CcpResult<ResponseFrame> {
        let frame = self.execute(command)?;
        if frame.is_ack() {
            return Ok(frame);
        }

        let code = frame.return_code();
        let _entered = self.connection.span().enter();
        warn!(command = %command.code(), %code, category = ?code.category(), "command rejected");
        let labels = ConnectionLabels::new(self.connection.name(), command.code().mnemonic())
            .with(&[("return_code", format!("0x{:02X}", u8::from(code)))]);
        metrics::counter!(metric_defs::REJECTED.name, &labels).increment(1);
        self.record(Err(CcpError::Rejected {
            command: command.code(),
            code,
        }))
    }

    fn request<R: DecodeResponse>(&self, command: Command) -> CcpResult<R> {
        let frame = self.acknowledged(&command)?;
        let decoded = R::from_frame(&frame).map_err(|source| CcpError::MalformedResponse {
            command: command.code(),
            source,
        });
        self.record(decoded)
    }

    fn upload_data(&self, command: Command, size: u8) -> CcpResult<Vec<u8>> {
        let frame = self.acknowledged(&command)?;
        let data = UploadData::from_payload(&frame.payload, size)
            .map(|data| data.0)
            .map_err(|source| CcpError::MalformedResponse {
                command: command.code(),
                source,
            });
        self.record(data)
    }

    fn record<R>(&self, result: CcpResult<R>) -> CcpResult<R> {
        if let Err(err) = &result {
            self.connection.record_error(err);
        }
        result
    }

    // ------------------------------------------------------------------------
    // Session management
    // ------------------------------------------------------------------------

    /// CONNECT to the configured station.
    pub fn connect(&self) -> CcpResult<()> {
        self.request::<()>(Command::Connect {
            station_address: self.connection.station_address(),
        })?;
        self.connection.update(|s| s.connected = true);
        Ok(())
    }

    /// DISCONNECT from the configured station.
    ///
    /// On success the stored pointers, unlocked resources and connected flag
    /// are cleared.
    pub fn disconnect(&self, mode: DisconnectMode) -> CcpResult<()> {
        self.request::<()>(Command::Disconnect {
            mode,
            station_address: self.connection.station_address(),
        })?;
        self.connection.update(|s| {
            s.connected = false;
            s.mta = [None, None];
            s.unlocked = ResourceMask::NONE;
        });
        Ok(())
    }

    /// TEST whether a station answers, without connecting to it.
    pub fn test(&self, station_address: u16) -> CcpResult<()> {
        self.request(Command::Test { station_address })
    }

    /// GET_CCP_VERSION, announcing the master's version.
    pub fn get_ccp_version(&self, major: u8, minor: u8) -> CcpResult<CcpVersion> {
        self.request(Command::GetCcpVersion { major, minor })
    }

    /// EXCHANGE_ID.
    pub fn exchange_id(&self, master_id: [u8; 6]) -> CcpResult<SlaveId> {
        self.request(Command::ExchangeId { master_id })
    }

    /// GET_SEED for `resource`.
    pub fn get_seed(&self, resource: ResourceMask) -> CcpResult<Seed> {
        self.request(Command::GetSeed { resource })
    }

    /// UNLOCK with a key computed from the seed.
    ///
    /// Returns the resources now unlocked, which also replace the connection's
    /// unlocked set.
    pub fn unlock(&self, key: &[u8]) -> CcpResult<ResourceMask> {
        let unlocked: ResourceMask = self.request(Command::Unlock { key: key.to_vec() })?;
        self.connection.update(|s| s.unlocked = unlocked);
        Ok(unlocked)
    }

    /// SET_S_STATUS.
    pub fn set_s_status(&self, status: SessionStatus) -> CcpResult<()> {
        self.request(Command::SetSStatus { status })
    }

    /// GET_S_STATUS.
    pub fn get_s_status(&self) -> CcpResult<SessionStatusInfo> {
        self.request(Command::GetSStatus)
    }

    // ------------------------------------------------------------------------
    // Memory access
    // ------------------------------------------------------------------------

    /// SET_MTA, storing the pointer on success.
    pub fn set_mta(&self, slot: MtaSlot, address: MemoryAddress) -> CcpResult<()> {
        self.request::<()>(Command::SetMta {
            slot,
            extension: address.extension,
            address: address.address,
        })?;
        self.connection.update(|s| s.mta[slot.index()] = Some(address));
        Ok(())
    }

    /// DNLOAD up to 5 bytes at MTA0.
    pub fn dnload(&self, data: &[u8]) -> CcpResult<MtaPosition> {
        self.request(Command::Dnload { data: data.to_vec() })
    }

    /// DNLOAD_6: exactly 6 bytes at MTA0.
    pub fn dnload6(&self, data: [u8; 6]) -> CcpResult<MtaPosition> {
        self.request(Command::Dnload6 { data })
    }

    /// UPLOAD `size` bytes (1 to 6) from MTA0.
    pub fn upload(&self, size: u8) -> CcpResult<Vec<u8>> {
        self.upload_data(Command::Upload { size }, size)
    }

    /// SHORT_UP `size` bytes (1 to 6) from `address`; MTA0 is left alone.
    pub fn short_up(&self, size: u8, address: MemoryAddress) -> CcpResult<Vec<u8>> {
        self.upload_data(
            Command::ShortUp {
                size,
                extension: address.extension,
                address: address.address,
            },
            size,
        )
    }

    /// BUILD_CHKSUM over `block_size` bytes from MTA0.
    pub fn build_chksum(&self, block_size: u32) -> CcpResult<Checksum> {
        self.request(Command::BuildChksum { block_size })
    }

    /// CLEAR_MEMORY: erase `size` bytes from MTA0.
    pub fn clear_memory(&self, size: u32) -> CcpResult<()> {
        self.request(Command::ClearMemory { size })
    }

    /// PROGRAM up to 5 bytes at MTA0.
    pub fn program(&self, data: &[u8]) -> CcpResult<MtaPosition> {
        self.request(Command::Program { data: data.to_vec() })
    }

    /// PROGRAM_6: exactly 6 bytes at MTA0.
    pub fn program6(&self, data: [u8; 6]) -> CcpResult<MtaPosition> {
        self.request(Command::Program6 { data })
    }

    /// MOVE `size` bytes from MTA0 to MTA1.
    pub fn move_memory(&self, size: u32) -> CcpResult<()> {
        self.request(Command::Move { size })
    }

    /// SELECT_CAL_PAGE: activate the page MTA0 points at.
    pub fn select_cal_page(&self) -> CcpResult<()> {
        self.request(Command::SelectCalPage)
    }

    /// GET_ACTIVE_CAL_PAGE.
    pub fn get_active_cal_page(&self) -> CcpResult<MtaPosition> {
        self.request(Command::GetActiveCalPage)
    }

    // ------------------------------------------------------------------------
    // DAQ list configuration
    // ------------------------------------------------------------------------

    /// GET_DAQ_SIZE; also clears the list and assigns it `dto_id`.
    pub fn get_daq_size(&self, daq_list: u8, dto_id: u32) -> CcpResult<DaqSize> {
        self.request(Command::GetDaqSize { daq_list, dto_id })
    }

    /// SET_DAQ_PTR.
    pub fn set_daq_ptr(&self, pointer: DaqPointer) -> CcpResult<()> {
        self.request(Command::SetDaqPtr(pointer))
    }

    /// WRITE_DAQ one element of 1, 2 or 4 bytes.
    pub fn write_daq(&self, element_size: u8, address: MemoryAddress) -> CcpResult<()> {
        self.request(Command::WriteDaq {
            element_size,
            extension: address.extension,
            address: address.address,
        })
    }

    /// START_STOP one DAQ list.
    pub fn start_stop(&self, control: DaqListControl) -> CcpResult<()> {
        self.request(Command::StartStop(control))
    }

    /// START_STOP_ALL prepared DAQ lists.
    pub fn start_stop_all(&self, start: bool) -> CcpResult<()> {
        self.request(Command::StartStopAll { start })
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.engine.router().unregister(self.connection.dto_id());
        let _entered = self.connection.span().enter();
        debug!(station = self.connection.station_address(), "session closed");
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection)
            .finish()
    }
}
