use crate::constants::{
    DEFAULT_DRAIN_TIMEOUT, DEFAULT_INTERFACE, DEFAULT_PRODUCT_ID, DEFAULT_TIMEOUT, ENDPOINT_IN, ENDPOINT_OUT,
    FULL_SPEED_PACKET_SIZE, LOW_SPEED_PACKET_SIZE, VENDOR_ID,
};
use std::time::Duration;

/// Addressing, framing and timing for one ADU device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    pub endpoint_out: u8,
    pub endpoint_in: u8,
    /// Frame size. `None` lets the transport pick it from the device speed.
    pub packet_size: Option<usize>,
    pub timeout: Duration,
    pub drain_timeout: Duration,
    /// Discard stale responses as soon as a session is opened.
    pub drain_on_open: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            interface: DEFAULT_INTERFACE,
            endpoint_out: ENDPOINT_OUT,
            endpoint_in: ENDPOINT_IN,
            packet_size: None,
            timeout: DEFAULT_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            drain_on_open: true,
        }
    }
}

impl DeviceConfig {
    /// Config for an Ontrak device with the given product ID (the model number, e.g. 208 for ADU208).
    pub fn for_product(product_id: u16) -> Self {
        Self {
            product_id,
            ..Self::default()
        }
    }

    pub fn with_vendor_id(mut self, vendor_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self
    }

    pub fn with_interface(mut self, interface: u8) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_endpoints(mut self, endpoint_out: u8, endpoint_in: u8) -> Self {
        self.endpoint_out = endpoint_out;
        self.endpoint_in = endpoint_in;
        self
    }

    pub fn with_packet_size(mut self, packet_size: usize) -> Self {
        self.packet_size = Some(packet_size);
        self
    }

    pub fn low_speed(self) -> Self {
        self.with_packet_size(LOW_SPEED_PACKET_SIZE)
    }

    pub fn full_speed(self) -> Self {
        self.with_packet_size(FULL_SPEED_PACKET_SIZE)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn with_drain_on_open(mut self, drain_on_open: bool) -> Self {
        self.drain_on_open = drain_on_open;
        self
    }
}

/// Frame size used by a device at the given USB speed.
pub fn packet_size_for_speed(speed: Option<nusb::Speed>) -> usize {
    match speed {
        Some(nusb::Speed::Low) => LOW_SPEED_PACKET_SIZE,
        Some(_) => FULL_SPEED_PACKET_SIZE,
        None => LOW_SPEED_PACKET_SIZE,
    }
}
