//! `ParlorServer` builder and accept loop.
//!
//! This is the entry point for running a Parlor server. It ties together
//! all the layers: transport → session → hub → room.

use std::net::SocketAddr;
use std::sync::Arc;

use parlor_game::GameRegistry;
use parlor_session::{Authenticator, Credentials, SessionError};
use parlor_transport::{
    Connection, PendingConnection, TransportConfig, TransportError, WebSocketTransport,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::hub::{Hub, HubHandle};
use crate::{ConnectionConfig, ParlorError, ServerConfig, client};

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,no_run
/// use parlor::prelude::*;
///
/// # async fn start() -> Result<(), ParlorError> {
/// let tokens = TokenTable::new().with("secret", Identity::new("u1", "Alice"));
/// let server = ParlorServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(tokens)
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ParlorServerBuilder {
    config: ServerConfig,
    registry: GameRegistry,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            registry: GameRegistry::standard(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_owned();
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the set of playable games.
    pub fn registry(mut self, registry: GameRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Binds the listener and starts the hub.
    pub async fn build<A: Authenticator>(self, auth: A) -> Result<ParlorServer<A>, ParlorError> {
        let transport = WebSocketTransport::bind(
            &self.config.bind_addr,
            TransportConfig {
                max_frame_size: self.config.connection.max_frame_size,
            },
        )
        .await?;
        let (hub, hub_task) = Hub::spawn(self.config.hub, self.config.room, self.registry);

        Ok(ParlorServer {
            transport,
            hub,
            hub_task,
            auth: Arc::new(auth),
            connection: self.config.connection,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parlor server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct ParlorServer<A: Authenticator> {
    transport: WebSocketTransport,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
    auth: Arc<A>,
    connection: ConnectionConfig,
}

impl<A: Authenticator> ParlorServer<A> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ParlorError> {
        self.run_until(CancellationToken::new()).await
    }

    /// Runs the accept loop until `shutdown` is cancelled, then stops the
    /// hub, which disconnects every client.
    pub async fn run_until(self, shutdown: CancellationToken) -> Result<(), ParlorError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Parlor server running");

        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.transport.accept() => accepted,
            };
            match accepted {
                Ok(pending) => {
                    let auth = Arc::clone(&self.auth);
                    let hub = self.hub.clone();
                    let config = self.connection;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(pending, auth, hub, config).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }

        tracing::info!("shutting down");
        let _ = self.hub.shutdown().await;
        let _ = self.hub_task.await;
        Ok(())
    }
}

/// Authenticates the upgrade request, then runs the client.
async fn handle_connection<A: Authenticator>(
    pending: PendingConnection,
    auth: Arc<A>,
    hub: HubHandle,
    config: ConnectionConfig,
) -> Result<(), ParlorError> {
    let addr = pending.peer_addr();
    let upgraded = pending
        .upgrade(|request| {
            let verdict = Credentials::from_request_parts(
                request.authorization.as_deref(),
                request.cookie.as_deref(),
                request.query.as_deref(),
            )
            .ok_or(SessionError::MissingCredentials)
            .and_then(|credentials| auth.authenticate(&credentials));
            match verdict {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!(%addr, path = %request.path, error = %e, "connection rejected");
                    None
                }
            }
        })
        .await;

    let (conn, identity) = match upgraded {
        Ok(upgraded) => upgraded,
        Err(TransportError::Unauthorized) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(client = %conn.id(), user = %identity.user_id, %addr, "client connected");
    client::run(conn, identity, hub, config).await
}
