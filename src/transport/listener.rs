//! # Listener
//!
//! Accepts TCP connections and hands them out through a bounded backlog.
//!
//! The listener owns the process-lifetime RSA keypair; every accepted
//! connection shares it read-only. The accept loop is its own task and exits
//! cleanly when the listener is closed.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::transport::connection::Connection;
use crate::utils::crypto::ServerKeypair;

/// Clonable handle that unblocks the accept loop.
#[derive(Clone)]
pub struct ListenerHandle {
    shutdown: mpsc::Sender<()>,
}

impl ListenerHandle {
    pub fn close(&self) {
        let _ = self.shutdown.try_send(());
    }
}

/// Bound TCP listener with its accept loop running.
pub struct Listener {
    local_addr: SocketAddr,
    keypair: Arc<ServerKeypair>,
    incoming: mpsc::Receiver<Connection>,
    shutdown: mpsc::Sender<()>,
}

impl Listener {
    /// Binds the configured address, generates the keypair, and starts
    /// accepting.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let address = format!("{}:{}", config.listener.host, config.listener.port);
        let tcp = TcpListener::bind(&address).await?;
        let local_addr = tcp.local_addr()?;

        let keypair = Arc::new(ServerKeypair::generate()?);

        let (incoming_tx, incoming) = mpsc::channel(config.listener.backlog);
        let (shutdown, mut shutdown_rx) = mpsc::channel::<()>(1);
        let max_frame_accumulation = config.transport.max_frame_accumulation;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("listener shutting down");
                        break;
                    }

                    accepted = tcp.accept() => match accepted {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "accepted connection");
                            match Connection::spawn(stream, max_frame_accumulation) {
                                Ok(connection) => {
                                    if incoming_tx.send(connection).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    error!(peer = %peer, error = %e, "failed to set up connection");
                                }
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "error accepting connection");
                        }
                    }
                }
            }
        });

        info!(address = %local_addr, "listening");

        Ok(Self {
            local_addr,
            keypair,
            incoming,
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The listener-scoped keypair shared by all accepted connections.
    pub fn keypair(&self) -> Arc<ServerKeypair> {
        Arc::clone(&self.keypair)
    }

    pub fn handle(&self) -> ListenerHandle {
        ListenerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Waits for the next accepted connection; `None` once the listener has
    /// closed.
    pub async fn accept(&mut self) -> Option<Connection> {
        self.incoming.recv().await
    }
}
