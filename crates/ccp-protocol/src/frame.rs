//! Frame encoding/decoding utilities.
//!
//! Both directions use a fixed 8-byte frame. Command frames are always
//! zero-padded to the full length; response frames shorter than 8 bytes
//! (a short CAN DLC) are zero-padded on decode.
//!
//! ```text
//! +--------+---------+----------------------+
//! | code   | counter | payload[0..6]        |
//! +--------+---------+----------------------+
//! ```

use crate::commands::CommandCode;
use crate::constants::*;
use crate::error::{ProtocolError, ReturnCode};

/// Encode a command frame.
///
/// Fails with [`ProtocolError::PayloadTooLarge`] if `payload` is longer than
/// 6 bytes; the remainder of a shorter payload is zero.
pub fn encode(opcode: CommandCode, counter: u8, payload: &[u8]) -> Result<[u8; FRAME_SIZE], ProtocolError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            max: MAX_PAYLOAD_SIZE,
            actual: payload.len(),
        });
    }
    let mut frame = [0u8; FRAME_SIZE];
    frame[0] = opcode.into();
    frame[1] = counter;
    frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
    Ok(frame)
}

/// Decode a response frame into its code, echoed counter and payload.
///
/// The counter is not checked here.
pub fn decode(frame: &[u8]) -> Result<ResponseFrame, ProtocolError> {
    ResponseFrame::decode(frame)
}

/// An encoded command frame (CRO).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; FRAME_SIZE],
}

impl CommandFrame {
    /// Build a command frame.
    pub fn new(opcode: CommandCode, counter: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        Ok(CommandFrame {
            bytes: encode(opcode, counter, payload)?,
        })
    }

    /// Opcode byte.
    pub fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    /// Counter byte.
    pub fn counter(&self) -> u8 {
        self.bytes[1]
    }

    /// Command payload, including padding.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[PAYLOAD_OFFSET..]
    }

    /// The full 8 bytes.
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.bytes
    }
}

/// A decoded response frame (DTO).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    /// Return or packet code (byte 0).
    pub code: u8,
    /// Echoed counter (byte 1).
    pub counter: u8,
    /// Response payload (bytes 2..8).
    pub payload: [u8; MAX_PAYLOAD_SIZE],
}

impl ResponseFrame {
    /// Build a response frame from parts. Mostly useful for test doubles.
    pub fn new(code: u8, counter: u8, payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                max: MAX_PAYLOAD_SIZE,
                actual: payload.len(),
            });
        }
        let mut buf = [0u8; MAX_PAYLOAD_SIZE];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(ResponseFrame {
            code,
            counter,
            payload: buf,
        })
    }

    /// Decode a response frame.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.len() < PAYLOAD_OFFSET {
            return Err(ProtocolError::FrameTooShort {
                expected: PAYLOAD_OFFSET,
                actual: frame.len(),
            });
        }
        if frame.len() > FRAME_SIZE {
            return Err(ProtocolError::FrameTooLong {
                max: FRAME_SIZE,
                actual: frame.len(),
            });
        }
        ResponseFrame::new(frame[0], frame[1], &frame[PAYLOAD_OFFSET..])
    }

    /// Byte 0 interpreted as a return code.
    pub fn return_code(&self) -> ReturnCode {
        ReturnCode::from(self.code)
    }

    /// Whether the slave acknowledged the command.
    pub fn is_ack(&self) -> bool {
        self.return_code().is_ack()
    }

    /// Encode back into 8 bytes.
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        let mut frame = [0u8; FRAME_SIZE];
        frame[0] = self.code;
        frame[1] = self.counter;
        frame[PAYLOAD_OFFSET..].copy_from_slice(&self.payload);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_every_command_code() {
        for (i, code) in CommandCode::ALL.iter().enumerate() {
            let counter = (i * 9) as u8;
            let frame = encode(*code, counter, &[0xAA]).unwrap();
            assert_eq!(frame.len(), FRAME_SIZE);
            assert_eq!(frame[0], u8::from(*code));
            assert_eq!(frame[1], counter);
            assert_eq!(frame[2], 0xAA);
            assert_eq!(&frame[3..], &[0, 0, 0, 0, 0]);
        }
    }

    #[test]
    fn test_encode_payload_too_large() {
        let err = encode(CommandCode::Dnload, 0, &[0; 7]).unwrap_err();
        assert_eq!(err, ProtocolError::PayloadTooLarge { max: 6, actual: 7 });
        assert!(CommandFrame::new(CommandCode::Dnload6, 0, &[0; 6]).is_ok());
    }

    #[test]
    fn test_decode_response() {
        let resp = decode(&[0x00, 0x05, 1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(resp.code, 0x00);
        assert_eq!(resp.counter, 0x05);
        assert_eq!(resp.payload, [1, 2, 3, 4, 5, 6]);
        assert!(resp.is_ack());
        assert_eq!(resp.to_bytes(), [0x00, 0x05, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_decode_short_dlc_is_padded() {
        let resp = decode(&[0x33, 0x01, 0x09]).unwrap();
        assert_eq!(resp.return_code(), ReturnCode::AccessDenied);
        assert_eq!(resp.payload, [0x09, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_decode_bad_lengths() {
        assert_eq!(
            decode(&[0x00]).unwrap_err(),
            ProtocolError::FrameTooShort { expected: 2, actual: 1 }
        );
        assert_eq!(
            decode(&[0; 9]).unwrap_err(),
            ProtocolError::FrameTooLong { max: 8, actual: 9 }
        );
    }
}
