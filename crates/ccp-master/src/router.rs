//! Demultiplexes received frames by response identifier.
//!
//! Several connections may wait on the same transport at once. Whichever
//! connection receives a frame files it in the mailbox of the connection it
//! belongs to; frames no open connection expects are dropped. A mailbox holds
//! at most [`MAILBOX_DEPTH`] frames and is emptied before each command is sent,
//! so traffic that arrives while a connection is idle never answers its next
//! command.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use ccp_metrics::metric_defs;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{CcpError, TransportError};
use crate::transport::{CanFrame, Transport};

/// Frames kept per connection between polls; older ones are dropped first.
pub const MAILBOX_DEPTH: usize = 64;

/// Routes inbound frames to per-connection mailboxes.
pub struct FrameRouter<T: Transport> {
    transport: Arc<T>,
    mailboxes: Mutex<HashMap<u32, VecDeque<CanFrame>>>,
}

impl<T: Transport> FrameRouter<T> {
    /// Create a router over a shared transport.
    pub fn new(transport: Arc<T>) -> Self {
        FrameRouter {
            transport,
            mailboxes: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Start collecting frames for `dto_id`.
    pub fn register(&self, dto_id: u32) -> Result<(), CcpError> {
        let mut mailboxes = self.mailboxes.lock();
        if mailboxes.contains_key(&dto_id) {
            return Err(CcpError::DuplicateResponseId(dto_id));
        }
        mailboxes.insert(dto_id, VecDeque::new());
        metrics::gauge!(metric_defs::OPEN_SESSIONS.name).increment(1.0);
        Ok(())
    }

    /// Stop collecting frames for `dto_id`, dropping any still queued.
    pub fn unregister(&self, dto_id: u32) {
        if let Some(pending) = self.mailboxes.lock().remove(&dto_id) {
            metrics::gauge!(metric_defs::OPEN_SESSIONS.name).decrement(1.0);
            if !pending.is_empty() {
                trace!(dto_id, dropped = pending.len(), "unregistered with frames pending");
            }
        }
    }

    /// Whether `dto_id` is registered.
    pub fn is_registered(&self, dto_id: u32) -> bool {
        self.mailboxes.lock().contains_key(&dto_id)
    }

    /// Number of frames waiting for `dto_id`.
    pub fn queued(&self, dto_id: u32) -> usize {
        self.mailboxes.lock().get(&dto_id).map_or(0, VecDeque::len)
    }

    /// Drop every frame waiting for `dto_id`, returning how many there were.
    pub fn clear(&self, dto_id: u32) -> usize {
        let dropped = match self.mailboxes.lock().get_mut(&dto_id) {
            Some(queue) => std::mem::take(queue).len(),
            None => 0,
        };
        if dropped > 0 {
            debug!(dto_id, dropped, "dropping frames received while idle");
            metrics::counter!(metric_defs::STALE_FRAMES.name).increment(dropped as u64);
        }
        dropped
    }

    /// Transmit a frame.
    pub fn send(&self, frame: &CanFrame) -> Result<(), TransportError> {
        self.transport.send(frame)
    }

    /// Wait up to `wait` for a frame addressed to `dto_id`.
    ///
    /// Returns `Ok(None)` if nothing for `dto_id` arrived in time; frames for
    /// other connections received meanwhile are queued for them.
    pub fn poll(&self, dto_id: u32, wait: Duration) -> Result<Option<CanFrame>, TransportError> {
        if let Some(frame) = self.take(dto_id) {
            return Ok(Some(frame));
        }
        match self.transport.receive(Some(wait))? {
            Some(frame) if frame.id == dto_id => Ok(Some(frame)),
            Some(frame) => {
                self.deliver(frame);
                Ok(self.take(dto_id))
            }
            None => Ok(self.take(dto_id)),
        }
    }

    /// Release the transport. Registrations stay until their sessions drop.
    pub fn shutdown(&self) -> Result<(), TransportError> {
        self.transport.shutdown()
    }

    fn take(&self, dto_id: u32) -> Option<CanFrame> {
        self.mailboxes.lock().get_mut(&dto_id)?.pop_front()
    }

    fn deliver(&self, frame: CanFrame) {
        let mut mailboxes = self.mailboxes.lock();
        match mailboxes.get_mut(&frame.id) {
            Some(queue) => {
                if queue.len() >= MAILBOX_DEPTH {
                    queue.pop_front();
                    trace!(id = frame.id, "mailbox full, dropping oldest frame");
                    metrics::counter!(metric_defs::STALE_FRAMES.name).increment(1);
                }
                queue.push_back(frame);
            }
            None => {
                trace!(id = frame.id, data = ?frame.data(), "discarding frame for no open connection");
                metrics::counter!(metric_defs::FRAMES_DISCARDED.name).increment(1);
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for FrameRouter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<u32> = self.mailboxes.lock().keys().copied().collect();
        f.debug_struct("FrameRouter").field("registered", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ReplayTransport;

    fn frame(id: u32, byte: u8) -> CanFrame {
        CanFrame::new(id, &[0xFF, byte, 0, 0, 0, 0, 0, 0]).unwrap()
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let router = FrameRouter::new(Arc::new(ReplayTransport::new()));
        router.register(0x101).unwrap();
        assert!(matches!(router.register(0x101), Err(CcpError::DuplicateResponseId(0x101))));
        router.unregister(0x101);
        assert!(!router.is_registered(0x101));
        router.register(0x101).unwrap();
    }

    #[test]
    fn test_frames_are_partitioned_by_id() {
        let transport = Arc::new(ReplayTransport::new());
        transport.push_frame(frame(0x201, 1));
        transport.push_frame(frame(0x999, 2));
        transport.push_frame(frame(0x101, 3));

        let router = FrameRouter::new(Arc::clone(&transport));
        router.register(0x101).unwrap();
        router.register(0x201).unwrap();

        let wait = Duration::from_millis(1);
        // 0x201 is queued for its owner, 0x999 is dropped, then 0x101 arrives.
        assert_eq!(router.poll(0x101, wait).unwrap(), None);
        assert_eq!(router.poll(0x101, wait).unwrap(), None);
        assert_eq!(router.poll(0x101, wait).unwrap(), Some(frame(0x101, 3)));
        assert_eq!(router.poll(0x201, wait).unwrap(), Some(frame(0x201, 1)));
        assert_eq!(router.poll(0x201, wait).unwrap(), None);
    }

    #[test]
    fn test_mailbox_is_bounded_and_clearable() {
        let transport = Arc::new(ReplayTransport::new());
        for i in 0..(MAILBOX_DEPTH + 10) {
            transport.push_frame(frame(0x201, i as u8));
        }
        let router = FrameRouter::new(Arc::clone(&transport));
        router.register(0x101).unwrap();
        router.register(0x201).unwrap();

        while transport.pending() > 0 {
            assert_eq!(router.poll(0x101, Duration::from_millis(1)).unwrap(), None);
        }
        assert_eq!(router.queued(0x201), MAILBOX_DEPTH);
        // The oldest frames went first.
        assert_eq!(router.poll(0x201, Duration::from_millis(1)).unwrap(), Some(frame(0x201, 10)));

        assert_eq!(router.clear(0x201), MAILBOX_DEPTH - 1);
        assert_eq!(router.queued(0x201), 0);
        assert_eq!(router.clear(0x999), 0);
    }

    #[test]
    fn test_poll_surfaces_transport_errors() {
        let transport = Arc::new(ReplayTransport::new());
        let router = FrameRouter::new(Arc::clone(&transport));
        router.shutdown().unwrap();
        assert!(matches!(
            router.poll(0x101, Duration::from_millis(1)),
            Err(TransportError::Closed)
        ));
    }
}
