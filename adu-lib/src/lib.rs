pub mod command;
pub mod config;
pub mod constants;
pub mod error;
#[cfg(feature = "hidapi")]
pub mod hid;
pub mod packet;
pub mod response;
pub mod session;
pub mod transport;
pub mod usb;

pub use command::{Command, CommandKind};
pub use config::DeviceConfig;
pub use error::{AduError, DecodeError, EncodeError, TransportError};
#[cfg(feature = "hidapi")]
pub use hid::HidTransport;
pub use packet::{Packet, encode};
pub use response::{Response, decode_numeric, decode_string, decode_string_into, lenient_decimal};
pub use session::{PendingResponse, Session};
pub use transport::Transport;
pub use usb::UsbTransport;
