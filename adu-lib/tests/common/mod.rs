//! Common test utilities and shared imports

// Not every test file uses every item here
#[allow(unused_imports)]
pub use adu_lib::{
    AduError, Command, CommandKind, DecodeError, DeviceConfig, EncodeError, Packet, Response, Session, Transport,
    TransportError, decode_numeric, decode_string, decode_string_into, encode,
};
#[allow(unused_imports)]
pub use std::time::Duration;

use std::collections::VecDeque;

/// One call made against a [`ScriptedTransport`], in order.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send(Vec<u8>),
    Receive(Duration),
}

/// In-memory transport that replays queued receive results and records every call.
///
/// Once the script runs out, every receive times out, like an idle device.
#[allow(dead_code)]
pub struct ScriptedTransport {
    pub packet_size: usize,
    pub replies: VecDeque<Result<Packet, TransportError>>,
    pub calls: Vec<Call>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(packet_size: usize) -> Self {
        Self {
            packet_size,
            replies: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Queue a reply whose payload is `text`.
    pub fn reply(mut self, text: &str) -> Self {
        let packet = encode(text, self.packet_size).expect("Reply must fit in a packet");
        self.replies.push_back(Ok(packet));
        self
    }

    pub fn reply_timeout(mut self) -> Self {
        self.replies.push_back(Err(TransportError::Timeout));
        self
    }

    pub fn reply_error(mut self, error: TransportError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Send(bytes) => Some(bytes.clone()),
                Call::Receive(_) => None,
            })
            .collect()
    }

    pub fn receive_calls(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Receive(_))).count()
    }
}

impl Transport for ScriptedTransport {
    fn packet_size(&self) -> usize {
        self.packet_size
    }

    fn send(&mut self, packet: &Packet, _timeout: Duration) -> Result<usize, TransportError> {
        self.calls.push(Call::Send(packet.as_bytes().to_vec()));
        Ok(packet.len())
    }

    fn receive(&mut self, timeout: Duration) -> Result<Packet, TransportError> {
        self.calls.push(Call::Receive(timeout));
        self.replies.pop_front().unwrap_or(Err(TransportError::Timeout))
    }
}

/// Config with distinct timeouts so tests can tell drain reads from query reads.
#[allow(dead_code)]
pub fn test_config() -> DeviceConfig {
    DeviceConfig::default()
        .low_speed()
        .with_timeout(Duration::from_millis(200))
        .with_drain_timeout(Duration::from_millis(50))
}

/// Route library logs through the test harness; safe to call from every test.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a raw 8-byte frame from hex, for replies that `encode` would reject.
#[allow(dead_code)]
pub fn frame_from_hex(hex_data: &str) -> Packet {
    let bytes = hex::decode(hex_data).expect("Failed to decode hex");
    Packet::from_received(&bytes, bytes.len())
}
