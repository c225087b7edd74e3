use crate::error::TransportError;
use crate::packet::Packet;
use std::time::Duration;

/// A blocking link that moves fixed-size packets to and from one device.
///
/// Implementations own the underlying handle exclusively and release it on drop.
pub trait Transport {
    /// Size of every frame sent and received on this link.
    fn packet_size(&self) -> usize;

    /// Send one packet, blocking for at most `timeout`. Returns the number of bytes transferred.
    fn send(&mut self, packet: &Packet, timeout: Duration) -> Result<usize, TransportError>;

    /// Receive one packet, blocking for at most `timeout`.
    ///
    /// [`TransportError::Timeout`] means nothing was queued and is not a fault.
    fn receive(&mut self, timeout: Duration) -> Result<Packet, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn packet_size(&self) -> usize {
        (**self).packet_size()
    }

    fn send(&mut self, packet: &Packet, timeout: Duration) -> Result<usize, TransportError> {
        (**self).send(packet, timeout)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Packet, TransportError> {
        (**self).receive(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn packet_size(&self) -> usize {
        (**self).packet_size()
    }

    fn send(&mut self, packet: &Packet, timeout: Duration) -> Result<usize, TransportError> {
        (**self).send(packet, timeout)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Packet, TransportError> {
        (**self).receive(timeout)
    }
}
