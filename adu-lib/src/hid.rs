use crate::config::DeviceConfig;
use crate::constants::LOW_SPEED_PACKET_SIZE;
use crate::error::{AduError, TransportError};
use crate::packet::Packet;
use crate::transport::Transport;
use hidapi::{HidApi, HidDevice, HidError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// ADU access through the operating system's HID driver using `hidapi`.
///
/// The packet marker doubles as the HID report ID, so frames go out and come
/// back unchanged.
pub struct HidTransport {
    device: HidDevice,
    _api: HidApi,
    packet_size: usize,
}

impl HidTransport {
    /// Open the first HID device matching the configured VID/PID.
    ///
    /// HID gives no access to the bus speed, so an unset packet size means the
    /// low-speed frame size.
    pub fn open(config: &DeviceConfig) -> Result<Self, AduError> {
        info!(pid = config.product_id, "Opening ADU device through hidapi...");
        let api = HidApi::new()?;
        let listed = api
            .device_list()
            .any(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id);
        let device = api
            .open(config.vendor_id, config.product_id)
            .map_err(|e| open_error(e, listed, config))?;
        if let Ok(Some(product)) = device.get_product_string() {
            info!(%product, "Connected");
        }

        Ok(Self {
            device,
            _api: api,
            packet_size: config.packet_size.unwrap_or(LOW_SPEED_PACKET_SIZE),
        })
    }
}

/// A device that enumerates but will not open is usually a permissions
/// problem, so the hidapi error is kept. Only an absent device is `DeviceNotFound`.
fn open_error(error: HidError, listed: bool, config: &DeviceConfig) -> AduError {
    if listed {
        warn!(error = %error, "Device is present but could not be opened; check permissions");
        AduError::Hid(error)
    } else {
        debug!(error = %error, "hidapi open failed");
        AduError::DeviceNotFound {
            vendor_id: config.vendor_id,
            product_id: config.product_id,
        }
    }
}

impl Transport for HidTransport {
    fn packet_size(&self) -> usize {
        self.packet_size
    }

    fn send(&mut self, packet: &Packet, _timeout: Duration) -> Result<usize, TransportError> {
        // hid_write has no timeout of its own
        let written = self.device.write(packet.as_bytes())?;
        if written < packet.len() {
            return Err(TransportError::ShortTransfer {
                expected: packet.len(),
                actual: written,
            });
        }
        Ok(written)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Packet, TransportError> {
        let mut buffer = vec![0u8; self.packet_size];
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        match self.device.read_timeout(&mut buffer, millis)? {
            0 => Err(TransportError::Timeout),
            read => Ok(Packet::from_received(&buffer[..read], self.packet_size)),
        }
    }
}
