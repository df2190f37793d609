//! The CAN transport capability.
//!
//! The master never talks to hardware directly. A [`Transport`] moves raw CAN
//! frames; adapters for SocketCAN, vendor interfaces or the in-process
//! [`VirtualBus`](crate::sim::VirtualBus) implement it.

use std::sync::Arc;
use std::time::Duration;

use ccp_protocol::{CommandFrame, ProtocolError, FRAME_SIZE};

use crate::error::TransportError;

/// A classic CAN frame: identifier plus up to 8 data bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// CAN identifier (11- or 29-bit).
    pub id: u32,
    data: [u8; FRAME_SIZE],
    len: usize,
}

impl CanFrame {
    /// Create a frame, failing if `data` is longer than 8 bytes.
    pub fn new(id: u32, data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() > FRAME_SIZE {
            return Err(ProtocolError::FrameTooLong {
                max: FRAME_SIZE,
                actual: data.len(),
            });
        }
        let mut buf = [0u8; FRAME_SIZE];
        buf[..data.len()].copy_from_slice(data);
        Ok(CanFrame {
            id,
            data: buf,
            len: data.len(),
        })
    }

    /// Wrap an encoded command frame.
    pub fn from_command(id: u32, frame: &CommandFrame) -> Self {
        CanFrame {
            id,
            data: *frame.as_bytes(),
            len: FRAME_SIZE,
        }
    }

    /// Data bytes (DLC length).
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Send/receive primitives over a CAN link.
///
/// Implementations must be safe to call from several threads at once; the
/// master serialises transactions per connection, not per transport.
pub trait Transport: Send + Sync {
    /// Transmit one frame.
    fn send(&self, frame: &CanFrame) -> Result<(), TransportError>;

    /// Wait for the next frame.
    ///
    /// `None` waits indefinitely. Returns `Ok(None)` when the timeout expires
    /// without a frame.
    fn receive(&self, timeout: Option<Duration>) -> Result<Option<CanFrame>, TransportError>;

    /// Release the link. Later calls may fail with [`TransportError::Closed`].
    fn shutdown(&self) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, frame: &CanFrame) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn receive(&self, timeout: Option<Duration>) -> Result<Option<CanFrame>, TransportError> {
        (**self).receive(timeout)
    }

    fn shutdown(&self) -> Result<(), TransportError> {
        (**self).shutdown()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, frame: &CanFrame) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn receive(&self, timeout: Option<Duration>) -> Result<Option<CanFrame>, TransportError> {
        (**self).receive(timeout)
    }

    fn shutdown(&self) -> Result<(), TransportError> {
        (**self).shutdown()
    }
}
