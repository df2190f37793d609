//! In-process transports for tests and bench setups.
//!
//! [`VirtualBus`] behaves like a CAN segment: every frame a node sends is seen
//! by every other node. [`ReplayTransport`] serves a fixed list of frames and
//! records what the master sent.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::trace;

use crate::error::TransportError;
use crate::transport::{CanFrame, Transport};

// ============================================================================
// Virtual bus
// ============================================================================

#[derive(Debug, Default)]
struct BusInner {
    nodes: Mutex<Vec<(usize, Sender<CanFrame>)>>,
    next_node: AtomicUsize,
}

/// A simulated CAN segment.
#[derive(Debug, Clone, Default)]
pub struct VirtualBus {
    inner: Arc<BusInner>,
}

impl VirtualBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new node.
    pub fn node(&self) -> BusNode {
        let id = self.inner.next_node.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = crossbeam_channel::unbounded();
        self.inner.nodes.lock().push((id, tx));
        BusNode {
            id,
            bus: Arc::clone(&self.inner),
            rx,
            closed: AtomicBool::new(false),
        }
    }

    /// Number of attached nodes.
    pub fn node_count(&self) -> usize {
        self.inner.nodes.lock().len()
    }
}

/// One station on a [`VirtualBus`].
#[derive(Debug)]
pub struct BusNode {
    id: usize,
    bus: Arc<BusInner>,
    rx: Receiver<CanFrame>,
    closed: AtomicBool,
}

impl BusNode {
    fn detach(&self) {
        self.bus.nodes.lock().retain(|(id, _)| *id != self.id);
    }
}

impl Transport for BusNode {
    fn send(&self, frame: &CanFrame) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        trace!(node = self.id, id = frame.id, data = ?frame.data(), "bus tx");
        for (id, tx) in self.bus.nodes.lock().iter() {
            if *id != self.id {
                // A node that went away simply misses the frame.
                let _ = tx.send(*frame);
            }
        }
        Ok(())
    }

    fn receive(&self, timeout: Option<Duration>) -> Result<Option<CanFrame>, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        match timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(frame) => Ok(Some(frame)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
            },
            None => self.rx.recv().map(Some).map_err(|_| TransportError::Closed),
        }
    }

    fn shutdown(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::Release);
        self.detach();
        Ok(())
    }
}

impl Drop for BusNode {
    fn drop(&mut self) {
        self.detach();
    }
}

// ============================================================================
// Replay transport
// ============================================================================

/// Serves pre-recorded frames and records sent ones.
///
/// `receive` hands out the queued frames in order regardless of what was
/// sent. With the queue empty it waits for [`push_frame`](Self::push_frame)
/// until the timeout passes, or indefinitely when there is none.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    incoming: Mutex<VecDeque<CanFrame>>,
    arrived: Condvar,
    sent: Mutex<Vec<CanFrame>>,
    link_error: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl ReplayTransport {
    /// Create a transport with nothing to replay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport replaying `frames`.
    pub fn with_frames(frames: impl IntoIterator<Item = CanFrame>) -> Self {
        let transport = Self::new();
        transport.incoming.lock().extend(frames);
        transport
    }

    /// Queue a frame for `receive`.
    pub fn push_frame(&self, frame: CanFrame) {
        self.incoming.lock().push_back(frame);
        self.arrived.notify_all();
    }

    /// Make every send fail with a link error until cleared with `None`.
    pub fn set_link_error(&self, error: Option<&str>) {
        *self.link_error.lock() = error.map(str::to_string);
    }

    /// Frames sent so far.
    pub fn sent(&self) -> Vec<CanFrame> {
        self.sent.lock().clone()
    }

    /// Frames not yet replayed.
    pub fn pending(&self) -> usize {
        self.incoming.lock().len()
    }
}

impl Transport for ReplayTransport {
    fn send(&self, frame: &CanFrame) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        if let Some(error) = self.link_error.lock().clone() {
            return Err(TransportError::Link(error));
        }
        self.sent.lock().push(*frame);
        Ok(())
    }

    fn receive(&self, timeout: Option<Duration>) -> Result<Option<CanFrame>, TransportError> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut incoming = self.incoming.lock();
        loop {
            if self.closed.load(Ordering::Acquire) {
                return Err(TransportError::Closed);
            }
            if let Some(frame) = incoming.pop_front() {
                return Ok(Some(frame));
            }
            match deadline {
                Some(deadline) => {
                    if self.arrived.wait_until(&mut incoming, deadline).timed_out() {
                        return Ok(incoming.pop_front());
                    }
                }
                None => self.arrived.wait(&mut incoming),
            }
        }
    }

    fn shutdown(&self) -> Result<(), TransportError> {
        // Under the queue lock so a waiting receiver cannot miss the wakeup.
        let _incoming = self.incoming.lock();
        self.closed.store(true, Ordering::Release);
        self.arrived.notify_all();
        Ok(())
    }
}
