//! Send one command, wait for its response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ccp_metrics::{metric_defs, ConnectionLabels};
use ccp_protocol::{CommandCode, CommandFrame, ProtocolError, ResponseFrame, MAX_PAYLOAD_SIZE};
use tracing::{debug, trace, warn};

use crate::config::TimeoutTable;
use crate::connection::Connection;
use crate::error::{CcpError, CcpResult};
use crate::router::FrameRouter;
use crate::transport::{CanFrame, Transport};

/// Drives command/response exchanges over a shared router.
pub struct TransactionEngine<T: Transport> {
    router: FrameRouter<T>,
    poll_interval: Duration,
    timeouts: TimeoutTable,
}

impl<T: Transport> TransactionEngine<T> {
    /// Create an engine.
    pub fn new(transport: Arc<T>, poll_interval: Duration, timeouts: TimeoutTable) -> Self {
        TransactionEngine {
            router: FrameRouter::new(transport),
            poll_interval,
            timeouts,
        }
    }

    /// The frame router.
    pub fn router(&self) -> &FrameRouter<T> {
        &self.router
    }

    /// Response timeout applied to `command`.
    pub fn timeout(&self, command: CommandCode) -> Duration {
        self.timeouts.get(command)
    }

    /// Run one transaction on `connection`.
    ///
    /// Consumes exactly one counter value and sends exactly one frame unless
    /// `payload` is longer than 6 bytes, in which case nothing happens. The
    /// response is returned whatever its return code; only correlation
    /// failures are errors. There is no retry.
    pub fn execute(
        &self,
        connection: &Connection,
        command: CommandCode,
        payload: &[u8],
    ) -> CcpResult<ResponseFrame> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: payload.len(),
            }
            .into());
        }

        let _serial = connection.lock_transactions();
        let _entered = connection.span().enter();
        let labels = ConnectionLabels::new(connection.name(), command.mnemonic()).to_labels();

        // Nothing received before the command goes out can answer it.
        self.router.clear(connection.dto_id());

        let counter = connection.sequencer().next();
        let frame = CommandFrame::new(command, counter, payload)?;
        let timeout = self.timeouts.get(command);

        debug!(%command, counter, ?timeout, "sending command");
        trace!(id = connection.cro_id(), bytes = ?frame.as_bytes(), "cro");
        metrics::counter!(metric_defs::TRANSACTIONS.name, &labels).increment(1);

        let started = Instant::now();
        if let Err(err) = self.router.send(&CanFrame::from_command(connection.cro_id(), &frame)) {
            warn!(%command, counter, error = %err, "send failed");
            metrics::counter!(metric_defs::TRANSPORT_ERRORS.name, &labels).increment(1);
            return Err(err.into());
        }

        let deadline = started + timeout;
        loop {
            let now = Instant::now();
            if now >= deadline {
                warn!(%command, counter, ?timeout, "no response");
                metrics::counter!(metric_defs::TIMEOUTS.name, &labels).increment(1);
                return Err(CcpError::Timeout { command, timeout });
            }
            let slice = (deadline - now).min(self.poll_interval);

            let received = match self.router.poll(connection.dto_id(), slice) {
                Ok(received) => received,
                Err(err) => {
                    warn!(%command, counter, error = %err, "receive failed");
                    metrics::counter!(metric_defs::TRANSPORT_ERRORS.name, &labels).increment(1);
                    return Err(err.into());
                }
            };
            let Some(received) = received else {
                continue;
            };

            trace!(id = received.id, bytes = ?received.data(), "dto");
            let response = ResponseFrame::decode(received.data())
                .map_err(|source| CcpError::MalformedResponse { command, source })?;

            if response.counter != counter {
                warn!(%command, expected = counter, actual = response.counter, "counter mismatch");
                metrics::counter!(metric_defs::COUNTER_MISMATCHES.name, &labels).increment(1);
                return Err(CcpError::CounterMismatch {
                    command,
                    expected: counter,
                    actual: response.counter,
                });
            }

            let elapsed = started.elapsed();
            metrics::histogram!(metric_defs::RESPONSE_TIME.name, &labels)
                .record(elapsed.as_micros() as f64);
            debug!(
                %command,
                counter,
                return_code = %response.return_code(),
                elapsed_us = elapsed.as_micros() as u64,
                "response"
            );
            return Ok(response);
        }
    }
}

impl<T: Transport> std::fmt::Debug for TransactionEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionEngine")
            .field("router", &self.router)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
