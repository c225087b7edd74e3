use crate::config::{DeviceConfig, packet_size_for_speed};
use crate::error::{AduError, TransportError};
use crate::packet::Packet;
use crate::transport::Transport;
use nusb::transfer::{Buffer, In, Interrupt, Out};
use nusb::{Endpoint, Interface, MaybeFuture};
use std::time::Duration;
use tracing::{debug, info, warn};

// How long to wait for a cancelled OUT transfer to come back
const CANCEL_GRACE: Duration = Duration::from_millis(100);

/// ADU access through its interrupt endpoints using `nusb`.
///
/// One IN transfer is kept queued at all times. A receive that times out
/// leaves it queued, so a reply arriving late is picked up by the next
/// receive rather than dropped.
pub struct UsbTransport {
    // Field order is drop order: endpoints, then the claimed interface.
    ep_out: Endpoint<Interrupt, Out>,
    ep_in: Endpoint<Interrupt, In>,
    interface: Interface,
    packet_size: usize,
}

impl UsbTransport {
    /// Find the first device matching the configured VID/PID, detach any kernel
    /// driver, claim the interface and open both interrupt endpoints.
    pub fn open(config: &DeviceConfig) -> Result<Self, AduError> {
        let vid = format!("{:#06x}", config.vendor_id);
        info!(
            %vid,
            pid = config.product_id,
            "Searching for ADU device..."
        );
        let device_info = nusb::list_devices()
            .wait()?
            .find(|d| d.vendor_id() == config.vendor_id && d.product_id() == config.product_id)
            .ok_or(AduError::DeviceNotFound {
                vendor_id: config.vendor_id,
                product_id: config.product_id,
            })?;

        info!(
            bus = device_info.bus_id(),
            addr = device_info.device_address(),
            speed = ?device_info.speed(),
            "Found device"
        );

        let packet_size = config
            .packet_size
            .unwrap_or_else(|| packet_size_for_speed(device_info.speed()));

        // If the claim fails, `device` is dropped on return and its handle closed.
        let device = device_info.open().wait()?;
        let interface = device.detach_and_claim_interface(config.interface).wait()?;
        info!(interface = config.interface, "Interface claimed successfully.");

        let ep_out = interface.endpoint::<Interrupt, Out>(config.endpoint_out)?;
        let ep_in = interface.endpoint::<Interrupt, In>(config.endpoint_in)?;
        debug!(
            out_max_packet = ep_out.max_packet_size(),
            in_max_packet = ep_in.max_packet_size(),
            packet_size,
            "Endpoints open"
        );

        Ok(Self {
            ep_out,
            ep_in,
            interface,
            packet_size,
        })
    }

    pub fn interface(&self) -> &Interface {
        &self.interface
    }

    /// IN requests must be a multiple of the endpoint's max packet size.
    fn in_request_len(&self) -> usize {
        let max_packet = self.ep_in.max_packet_size().max(1);
        self.packet_size.div_ceil(max_packet) * max_packet
    }

    fn reap_cancelled_out(&mut self) {
        while self.ep_out.pending() > 0 {
            match self.ep_out.wait_next_complete(CANCEL_GRACE) {
                Some(completion) => debug!(status = ?completion.status, "Reaped cancelled write"),
                None => {
                    warn!("Cancelled write did not complete in time");
                    break;
                }
            }
        }
    }
}

impl Transport for UsbTransport {
    fn packet_size(&self) -> usize {
        self.packet_size
    }

    fn send(&mut self, packet: &Packet, timeout: Duration) -> Result<usize, TransportError> {
        self.reap_cancelled_out();

        self.ep_out.submit(Buffer::from(packet.as_bytes().to_vec()));
        let Some(completion) = self.ep_out.wait_next_complete(timeout) else {
            self.ep_out.cancel_all();
            self.reap_cancelled_out();
            return Err(TransportError::Timeout);
        };
        completion.status?;

        if completion.actual_len < packet.len() {
            return Err(TransportError::ShortTransfer {
                expected: packet.len(),
                actual: completion.actual_len,
            });
        }
        Ok(completion.actual_len)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Packet, TransportError> {
        if self.ep_in.pending() == 0 {
            let request_len = self.in_request_len();
            self.ep_in.submit(Buffer::new(request_len));
        }

        let completion = self.ep_in.wait_next_complete(timeout).ok_or(TransportError::Timeout)?;
        completion.status?;

        let received = &completion.buffer[..completion.actual_len.min(completion.buffer.len())];
        if received.len() != self.packet_size {
            debug!(
                expected = self.packet_size,
                actual = received.len(),
                "Received frame of unexpected size"
            );
        }
        Ok(Packet::from_received(received, self.packet_size))
    }
}
