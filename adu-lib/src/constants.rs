// Protocol constants for Ontrak ADU devices

use std::time::Duration;

/// Ontrak Control Systems vendor ID
pub const VENDOR_ID: u16 = 0x0A07;

/// ADU208 product ID. Every ADU model uses its model number as product ID.
pub const DEFAULT_PRODUCT_ID: u16 = 208;

/// Interface carrying the interrupt endpoints
pub const DEFAULT_INTERFACE: u8 = 0;

pub const ENDPOINT_OUT: u8 = 0x01;
pub const ENDPOINT_IN: u8 = 0x81;

/// First byte of every command and response packet (HID report ID)
pub const REPORT_MARKER: u8 = 0x01;

/// Transfer size of low-speed ADU models
pub const LOW_SPEED_PACKET_SIZE: usize = 8;

/// Transfer size of full-speed ADU models
pub const FULL_SPEED_PACKET_SIZE: usize = 64;

/// Default timeout for a single send or receive
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

/// Default receive timeout while discarding stale responses
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(200);
