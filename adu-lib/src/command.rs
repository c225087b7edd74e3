use crate::error::EncodeError;
use crate::packet::Packet;
use std::fmt;
use strum_macros::Display;

/// Whether the device answers a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CommandKind {
    /// Changes device state; the device sends nothing back.
    Action,
    /// Requests a value; exactly one response packet follows.
    Query,
}

/// An ASCII device command such as `RK0` or `MK255`, tagged with whether it
/// produces a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
    kind: CommandKind,
}

impl Command {
    pub fn action(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CommandKind::Action,
        }
    }

    pub fn query(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: CommandKind::Query,
        }
    }

    /// `R<port><relay>`: open (reset) a relay.
    pub fn reset_relay(port: char, relay: u8) -> Self {
        Self::action(format!("R{port}{relay}"))
    }

    /// `S<port><relay>`: close (set) a relay.
    pub fn set_relay(port: char, relay: u8) -> Self {
        Self::action(format!("S{port}{relay}"))
    }

    /// `M<port><value>`: write all bits of a port at once.
    pub fn write_port(port: char, value: u8) -> Self {
        Self::action(format!("M{port}{value}"))
    }

    /// `RP<port><relay>`: read back one relay, answered with 0 or 1.
    pub fn read_relay(port: char, relay: u8) -> Self {
        Self::query(format!("RP{port}{relay}"))
    }

    /// `P<port>`: read a whole port as a decimal byte value.
    pub fn read_port(port: char) -> Self {
        Self::query(format!("P{port}"))
    }

    /// `WD`: read the watchdog setting.
    pub fn read_watchdog() -> Self {
        Self::query("WD")
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn expects_response(&self) -> bool {
        self.kind == CommandKind::Query
    }

    pub fn encode(&self, packet_size: usize) -> Result<Packet, EncodeError> {
        Packet::encode(&self.text, packet_size)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
