//! # Connection
//!
//! One accepted socket: the read pump, the inbound packet queue, the
//! end-of-stream signal, and encrypted writes.
//!
//! The read pump runs as its own task for the connection's lifetime. It
//! reads raw bytes, decrypts them in place once a cipher is active, feeds
//! them to the framer, and publishes complete packets to a bounded queue. On
//! any read error, remote close, or fatal framing error it stops and signals
//! end-of-stream exactly once.
//!
//! Encryption activation is one-way: before [`Connection::enable_encryption`]
//! all bytes are plaintext; from the moment the cipher pair is installed,
//! every read and write is transformed through it. There is no re-keying.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::INBOUND_QUEUE_CAPACITY;
use crate::core::codec::PacketFramer;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::utils::crypto::{StreamDecryptor, StreamEncryptor};

/// What the actor sees from the network side: one packet, or the end of the
/// stream.
#[derive(Debug)]
pub enum NetworkEvent {
    Packet(Packet),
    Eof,
}

/// One live connection. Destroyed on close; nothing survives a reconnect.
pub struct Connection {
    peer: SocketAddr,
    writer: OwnedWriteHalf,
    encryptor: Option<StreamEncryptor>,
    decryptor: Arc<Mutex<Option<StreamDecryptor>>>,
    packets: mpsc::Receiver<Packet>,
    eof: mpsc::Receiver<()>,
}

impl Connection {
    /// Wraps an accepted socket and spawns its read pump.
    pub fn spawn(stream: TcpStream, max_frame_accumulation: usize) -> Result<Self> {
        let peer = stream.peer_addr()?;
        let (reader, writer) = stream.into_split();

        let (packets_tx, packets) = mpsc::channel(INBOUND_QUEUE_CAPACITY);
        let (eof_tx, eof) = mpsc::channel(1);
        let decryptor: Arc<Mutex<Option<StreamDecryptor>>> = Arc::new(Mutex::new(None));

        tokio::spawn(read_pump(
            reader,
            Arc::clone(&decryptor),
            PacketFramer::new(max_frame_accumulation),
            packets_tx,
            eof_tx,
            peer,
        ));

        Ok(Self {
            peer,
            writer,
            encryptor: None,
            decryptor,
            packets,
            eof,
        })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Serializes the packet, encrypts in place if a cipher is active, and
    /// performs one write.
    pub async fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        let mut bytes = packet.marshal();
        if let Some(encryptor) = &mut self.encryptor {
            encryptor.encrypt(&mut bytes);
        }
        self.writer.write_all(&bytes).await?;
        Ok(())
    }

    /// Installs the cipher pair for both directions. Irreversible.
    pub fn enable_encryption(&mut self, shared_secret: &[u8]) -> Result<()> {
        let encryptor = StreamEncryptor::new(shared_secret)?;
        let decryptor = StreamDecryptor::new(shared_secret)?;

        self.encryptor = Some(encryptor);
        let mut guard = self
            .decryptor
            .lock()
            .map_err(|_| ProtocolError::Handshake("cipher state poisoned".into()))?;
        *guard = Some(decryptor);

        debug!(peer = %self.peer, "stream encryption enabled");
        Ok(())
    }

    /// Waits for the next inbound packet or the end of the stream. Packets
    /// already queued are delivered before the end-of-stream signal.
    pub async fn next_event(&mut self) -> NetworkEvent {
        tokio::select! {
            biased;

            packet = self.packets.recv() => match packet {
                Some(packet) => NetworkEvent::Packet(packet),
                None => NetworkEvent::Eof,
            },
            _ = self.eof.recv() => NetworkEvent::Eof,
        }
    }

    /// Shuts the write side down. Safe to call repeatedly.
    pub async fn close(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}

async fn read_pump(
    mut reader: OwnedReadHalf,
    decryptor: Arc<Mutex<Option<StreamDecryptor>>>,
    mut framer: PacketFramer,
    packets_tx: mpsc::Sender<Packet>,
    eof_tx: mpsc::Sender<()>,
    peer: SocketAddr,
) {
    let mut buf = [0u8; 4096];

    'pump: loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                debug!(peer = %peer, "remote closed the connection");
                break 'pump;
            }
            Ok(n) => n,
            Err(e) => {
                warn!(peer = %peer, error = %e, "socket read failed");
                break 'pump;
            }
        };

        let chunk = &mut buf[..n];
        match decryptor.lock() {
            Ok(mut guard) => {
                if let Some(decryptor) = guard.as_mut() {
                    decryptor.decrypt(chunk);
                }
            }
            Err(_) => {
                warn!(peer = %peer, "cipher state poisoned");
                break 'pump;
            }
        }

        let packets = match framer.feed(chunk) {
            Ok(packets) => packets,
            Err(e) => {
                warn!(peer = %peer, error = %e, "framing error");
                break 'pump;
            }
        };

        for packet in packets {
            // the queue is bounded; a send fails only when the actor is gone
            if packets_tx.send(packet).await.is_err() {
                break 'pump;
            }
        }
    }

    // sole sender: the signal fires exactly once
    let _ = eof_tx.try_send(());
}
