use crate::command::CommandKind;
use thiserror::Error;

/// Failure to frame a command into a packet. No I/O has happened when this is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Command is {len} bytes, but the packet only has room for {max}")]
    CommandTooLong { len: usize, max: usize },

    #[error("Command contains byte {byte:#04x} at offset {offset}; only non-NUL ASCII is allowed")]
    InvalidCharacter { byte: u8, offset: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Destination buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Response payload is not valid text (first bad byte at offset {offset})")]
    InvalidText { offset: usize },

    #[error("Response payload {text:?} is not a decimal number")]
    NotNumeric { text: String },

    #[error("Packet starts with {found:#04x}, expected report marker 0x01")]
    MissingMarker { found: u8 },

    #[error("Packet is {actual} bytes, expected {expected}")]
    WrongSize { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// Nothing arrived within the timeout. Expected while draining.
    #[error("Timed out waiting for the device")]
    Timeout,

    /// The USB transfer itself failed. HID failures are reported as `Hid` (feature `hidapi`);
    /// [`TransportError::is_io_failure`] covers both.
    #[error("USB transfer failed: {0}")]
    IoFailure(#[from] nusb::transfer::TransferError),

    #[cfg(feature = "hidapi")]
    #[error("HID I/O failed: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Short transfer: {actual} of {expected} bytes")]
    ShortTransfer { expected: usize, actual: usize },
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout)
    }

    /// True for a failed transfer on either backend.
    pub fn is_io_failure(&self) -> bool {
        match self {
            TransportError::IoFailure(_) => true,
            #[cfg(feature = "hidapi")]
            TransportError::Hid(_) => true,
            _ => false,
        }
    }
}

/// The primary error type for the `adu-lib` library.
#[derive(Error, Debug)]
pub enum AduError {
    #[error("ADU device {vendor_id:04x}:{product_id:04x} not found. Is it connected?")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[cfg(feature = "hidapi")]
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Command {command:?} is not a {expected} command")]
    WrongCommandKind { command: String, expected: CommandKind },
}
