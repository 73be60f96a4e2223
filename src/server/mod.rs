//! # Server
//!
//! Ties the transport and protocol layers together: one listener, one
//! session actor per accepted connection.
//!
//! Each session gets its own handler instance; the only state shared between
//! connections is the listener's read-only keypair. Idle connections are not
//! timed out here; a connection lives until the remote closes, an error
//! occurs, or the listener shuts down.

pub mod handlers;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::protocol::registry::Registry;
use crate::server::handlers::VanillaHandler;
use crate::server::session::Session;
use crate::transport::{Listener, ListenerHandle};

/// Clonable handle that stops the server accepting new connections.
#[derive(Clone)]
pub struct ServerHandle {
    listener: ListenerHandle,
}

impl ServerHandle {
    pub fn close(&self) {
        self.listener.close();
    }
}

/// The protocol server: accept loop plus per-connection sessions.
pub struct Server {
    config: ServerConfig,
    listener: Listener,
    registry: Arc<Registry>,
}

impl Server {
    /// Binds the listener and builds the schema registry.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = Listener::bind(&config).await?;
        let registry = Arc::new(Registry::vanilla()?);
        Ok(Self {
            config,
            listener,
            registry,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            listener: self.listener.handle(),
        }
    }

    /// Accepts until the listener closes, spawning one session per
    /// connection. Live sessions keep running after accept stops.
    pub async fn run(mut self) {
        info!("server is ready");

        while let Some(connection) = self.listener.accept().await {
            info!(peer = %connection.peer(), "new connection");

            let handler =
                VanillaHandler::new(self.listener.keypair(), self.config.status.clone());
            let session = Session::new(connection, Arc::clone(&self.registry), handler);
            tokio::spawn(session.run());
        }

        info!("server stopped accepting connections");
    }
}
