//! # Session Actor
//!
//! The per-connection state machine: one task that owns the protocol state
//! and the connection, draining an internal control mailbox and the inbound
//! packet stream under strict ordering rules.
//!
//! ## Ordering Contract
//! On each loop iteration every queued mailbox command is applied first, in
//! arrival order, before a single network event is serviced. While the actor
//! waits for a network event, a concurrently arriving mailbox command wins
//! the race and restarts the loop (re-draining the mailbox) instead of being
//! deferred. Handler-issued state changes and sends are never starved
//! behind a backlog of inbound packets, and network events are still
//! processed one at a time.
//!
//! The mailbox is the only channel through which handler logic may affect
//! the actor or cause writes; handlers never touch the socket. Producers use
//! non-blocking sends against a generously sized bounded queue, so a
//! producer can never deadlock the actor against itself.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::MAILBOX_CAPACITY;
use crate::error::{ProtocolError, Result};
use crate::protocol::messages::ClientboundMessage;
use crate::protocol::registry::Registry;
use crate::protocol::ProtocolState;
use crate::server::handlers::PacketHandler;
use crate::transport::{Connection, NetworkEvent};

/// Control messages consumed by the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    ChangeState(ProtocolState),
    Send(ClientboundMessage),
    EnableEncryption(Zeroizing<[u8; 16]>),
}

/// Multi-producer side of the session mailbox.
///
/// Handed to handler logic; all sends are non-blocking.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Builds a detached handle plus its consumer end, for driving handler
    /// logic without a live session (custom actors, tests).
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Requests a protocol-state transition.
    pub fn change_state(&self, state: ProtocolState) -> Result<()> {
        self.send_command(SessionCommand::ChangeState(state))
    }

    /// Requests an outbound message be sent.
    pub fn send_message(&self, message: ClientboundMessage) -> Result<()> {
        self.send_command(SessionCommand::Send(message))
    }

    /// Requests the stream cipher be installed.
    pub fn enable_encryption(&self, shared_secret: Zeroizing<[u8; 16]>) -> Result<()> {
        self.send_command(SessionCommand::EnableEncryption(shared_secret))
    }

    fn send_command(&self, command: SessionCommand) -> Result<()> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => ProtocolError::MailboxFull,
            TrySendError::Closed(_) => ProtocolError::MailboxClosed,
        })
    }
}

/// One connection's actor: protocol state, connection, and mailbox.
pub struct Session<H: PacketHandler> {
    state: ProtocolState,
    connection: Connection,
    registry: Arc<Registry>,
    handler: H,
    mailbox: mpsc::Receiver<SessionCommand>,
    handle: SessionHandle,
}

impl<H: PacketHandler> Session<H> {
    pub fn new(connection: Connection, registry: Arc<Registry>, handler: H) -> Self {
        let (tx, mailbox) = mpsc::channel(MAILBOX_CAPACITY);
        Self {
            state: ProtocolState::Handshaking,
            connection,
            registry,
            handler,
            mailbox,
            handle: SessionHandle { tx },
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Runs the actor until EOF or a connection-fatal error, then closes the
    /// connection.
    pub async fn run(mut self) {
        let peer = self.connection.peer();
        if let Err(e) = self.run_loop().await {
            warn!(peer = %peer, error = %e, "session terminated");
        }
        self.connection.close().await;
        info!(peer = %peer, "session closed");
    }

    async fn run_loop(&mut self) -> Result<()> {
        loop {
            // Apply everything already queued, in arrival order.
            loop {
                match self.mailbox.try_recv() {
                    Ok(command) => self.apply_command(command).await?,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        return Err(ProtocolError::MailboxClosed)
                    }
                }
            }

            // One network event at a time; the mailbox wins ties and sends
            // the loop back to the drain above.
            tokio::select! {
                biased;

                command = self.mailbox.recv() => match command {
                    Some(command) => self.apply_command(command).await?,
                    None => return Err(ProtocolError::MailboxClosed),
                },

                event = self.connection.next_event() => match event {
                    NetworkEvent::Eof => {
                        debug!(peer = %self.connection.peer(), "end of stream");
                        return Ok(());
                    }
                    NetworkEvent::Packet(packet) => {
                        let message = self.registry.decode_inbound(self.state, &packet)?;
                        self.handler.handle(self.state, message, &self.handle)?;
                    }
                },
            }
        }
    }

    async fn apply_command(&mut self, command: SessionCommand) -> Result<()> {
        match command {
            SessionCommand::ChangeState(next) => {
                // the state machine only moves forward
                if next <= self.state {
                    return Err(ProtocolError::IllegalStateTransition {
                        from: self.state,
                        to: next,
                    });
                }
                info!(peer = %self.connection.peer(), from = %self.state, to = %next, "state change");
                self.state = next;
                Ok(())
            }
            SessionCommand::Send(message) => {
                let packet = self.registry.encode_outbound(&message)?;
                debug!(
                    peer = %self.connection.peer(),
                    name = message.name(),
                    id = packet.id,
                    "sending packet"
                );
                self.connection.write_packet(&packet).await
            }
            SessionCommand::EnableEncryption(shared_secret) => {
                self.connection.enable_encryption(&*shared_secret)
            }
        }
    }
}
