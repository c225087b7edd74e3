use crate::command::{Command, CommandKind};
use crate::config::DeviceConfig;
use crate::error::{AduError, TransportError};
use crate::response::Response;
use crate::transport::Transport;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Request/response discipline over one exclusively owned transport.
///
/// The protocol carries no request IDs, so a response can only be matched to
/// the query sent right before it. `Session` keeps that pairing intact:
/// stale responses are drained up front, actions never wait for a reply, and
/// a query hands out a [`PendingResponse`] that borrows the session until the
/// reply has been read. A reply that was never read (the guard was dropped, or
/// its receive timed out) is drained before the next command goes out.
pub struct Session<T: Transport> {
    transport: T,
    timeout: Duration,
    drain_timeout: Duration,
    // Set once a query is sent, cleared when its response is read or drained.
    awaiting_response: bool,
}

impl<T: Transport> Session<T> {
    /// Wrap a transport without touching the device.
    pub fn new(transport: T, config: &DeviceConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout,
            drain_timeout: config.drain_timeout,
            awaiting_response: false,
        }
    }

    /// Wrap a transport and, if configured, drain stale responses right away.
    pub fn open(transport: T, config: &DeviceConfig) -> Result<Self, AduError> {
        let mut session = Self::new(transport, config);
        if config.drain_on_open {
            session.drain()?;
        }
        Ok(session)
    }

    pub fn packet_size(&self) -> usize {
        self.transport.packet_size()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// True while a query's response has been neither read nor drained.
    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response
    }

    /// Read and discard until the device has nothing queued. Returns how many
    /// packets were thrown away.
    pub fn drain(&mut self) -> Result<usize, TransportError> {
        let mut discarded = 0;
        loop {
            match self.transport.receive(self.drain_timeout) {
                Ok(packet) => {
                    debug!(bytes = hex::encode(packet.as_bytes()), "Discarding stale response");
                    discarded += 1;
                }
                Err(TransportError::Timeout) => break,
                Err(e) => return Err(e),
            }
        }
        if discarded > 0 {
            info!(discarded, "Drained stale responses");
        }
        self.awaiting_response = false;
        Ok(discarded)
    }

    /// Send an action command. No response is read.
    pub fn execute(&mut self, command: &Command) -> Result<usize, AduError> {
        Self::check_kind(command, CommandKind::Action)?;
        self.discard_unread_response()?;
        self.send(command)
    }

    /// Send a query and return the guard through which its response must be read.
    pub fn send_query(&mut self, command: &Command) -> Result<PendingResponse<'_, T>, AduError> {
        Self::check_kind(command, CommandKind::Query)?;
        self.discard_unread_response()?;
        self.send(command)?;
        self.awaiting_response = true;
        Ok(PendingResponse {
            session: self,
            command: command.clone(),
        })
    }

    /// Send a query and read its response.
    pub fn query(&mut self, command: &Command) -> Result<Response, AduError> {
        self.send_query(command)?.receive()
    }

    /// Send a query and decode its response leniently as a number.
    pub fn query_numeric(&mut self, command: &Command) -> Result<i64, AduError> {
        Ok(self.query(command)?.numeric())
    }

    fn check_kind(command: &Command, expected: CommandKind) -> Result<(), AduError> {
        if command.kind() == expected {
            Ok(())
        } else {
            Err(AduError::WrongCommandKind {
                command: command.text().to_string(),
                expected,
            })
        }
    }

    fn discard_unread_response(&mut self) -> Result<(), AduError> {
        if self.awaiting_response {
            warn!("Previous query response was never read, draining before the next command");
            self.drain()?;
        }
        Ok(())
    }

    fn send(&mut self, command: &Command) -> Result<usize, AduError> {
        let packet = command.encode(self.transport.packet_size())?;
        debug!(%command, bytes = hex::encode(packet.as_bytes()), "USB Write");
        let sent = self.transport.send(&packet, self.timeout)?;
        Ok(sent)
    }
}

/// A query whose response has not been read yet.
///
/// Holding this keeps the session mutably borrowed, so no other command can be
/// sent until [`receive`](Self::receive) consumes it. If it is dropped instead,
/// or the receive fails, the session drains the reply before its next command.
#[must_use = "the response to a query must be received before sending another command"]
pub struct PendingResponse<'a, T: Transport> {
    session: &'a mut Session<T>,
    command: Command,
}

impl<T: Transport> PendingResponse<'_, T> {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn receive(self) -> Result<Response, AduError> {
        let packet = self.session.transport.receive(self.session.timeout)?;
        debug!(command = %self.command, bytes = hex::encode(packet.as_bytes()), "USB Read");
        if !packet.has_marker() {
            warn!(
                command = %self.command,
                marker = ?packet.marker(),
                "Response does not start with the report marker"
            );
        }
        self.session.awaiting_response = false;
        Ok(Response::new(packet))
    }
}
