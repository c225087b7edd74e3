use crate::constants::REPORT_MARKER;
use crate::error::{DecodeError, EncodeError};
use bytes::{Bytes, BytesMut};
use std::ops::Deref;

/// A fixed-size command or response frame.
///
/// Byte 0 is the report marker `0x01`, the ASCII payload follows, and the
/// rest of the frame is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    bytes: Bytes,
}

/// Frame `command` into a zero-padded packet of exactly `packet_size` bytes.
pub fn encode(command: &str, packet_size: usize) -> Result<Packet, EncodeError> {
    Packet::encode(command, packet_size)
}

impl Packet {
    pub fn encode(command: &str, packet_size: usize) -> Result<Self, EncodeError> {
        let command = command.as_bytes();
        let max = packet_size.saturating_sub(1);
        if packet_size == 0 || command.len() > max {
            return Err(EncodeError::CommandTooLong {
                len: command.len(),
                max,
            });
        }
        if let Some(offset) = command.iter().position(|&b| b == 0 || !b.is_ascii()) {
            return Err(EncodeError::InvalidCharacter {
                byte: command[offset],
                offset,
            });
        }

        let mut buffer = BytesMut::zeroed(packet_size);
        buffer[0] = REPORT_MARKER;
        buffer[1..=command.len()].copy_from_slice(command);
        Ok(Self {
            bytes: buffer.freeze(),
        })
    }

    /// Wrap a frame that must be exactly `packet_size` bytes and start with the marker.
    pub fn from_bytes(bytes: Bytes, packet_size: usize) -> Result<Self, DecodeError> {
        if bytes.len() != packet_size {
            return Err(DecodeError::WrongSize {
                expected: packet_size,
                actual: bytes.len(),
            });
        }
        match bytes.first() {
            Some(&REPORT_MARKER) => Ok(Self { bytes }),
            Some(&found) => Err(DecodeError::MissingMarker { found }),
            None => Err(DecodeError::WrongSize {
                expected: packet_size,
                actual: 0,
            }),
        }
    }

    /// Build a frame from whatever a transport read, zero-padding or cutting it to `packet_size`.
    ///
    /// The marker is left as received.
    pub fn from_received(data: &[u8], packet_size: usize) -> Self {
        let mut buffer = BytesMut::zeroed(packet_size);
        let len = data.len().min(packet_size);
        buffer[..len].copy_from_slice(&data[..len]);
        Self {
            bytes: buffer.freeze(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn marker(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    pub fn has_marker(&self) -> bool {
        self.marker() == Some(REPORT_MARKER)
    }

    /// Everything after the marker, padding included.
    pub fn payload(&self) -> &[u8] {
        self.bytes.get(1..).unwrap_or_default()
    }

    /// The payload up to its first zero byte.
    pub fn payload_text_bytes(&self) -> &[u8] {
        let payload = self.payload();
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        &payload[..end]
    }
}

impl Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Packet> for Bytes {
    fn from(packet: Packet) -> Self {
        packet.bytes
    }
}
