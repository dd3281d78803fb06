//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, watch};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{StatusCode, header};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::{Connection, ConnectionId, Incoming, TransportError, UpgradeRequest};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Frames above this size are a protocol violation and end the connection.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20;

type WsStream = WebSocketStream<TcpStream>;

/// Hard limits enforced by the WebSocket codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub max_frame_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

fn io_error(kind: std::io::ErrorKind, e: WsError) -> std::io::Error {
    std::io::Error::new(kind, e)
}

/// Listens for TCP connections that may be upgraded to WebSockets.
pub struct WebSocketTransport {
    listener: TcpListener,
    config: TransportConfig,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str, config: TransportConfig) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener, config })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next TCP connection. The WebSocket handshake has
    /// not happened yet; see [`PendingConnection::upgrade`].
    pub async fn accept(&self) -> Result<PendingConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::debug!(%addr, "accepted TCP connection");
        Ok(PendingConnection {
            stream,
            addr,
            config: self.config,
        })
    }
}

/// An accepted TCP stream awaiting its WebSocket handshake.
pub struct PendingConnection {
    stream: TcpStream,
    addr: SocketAddr,
    config: TransportConfig,
}

impl PendingConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Performs the handshake, consulting `admit` with the request first.
    ///
    /// When `admit` returns `None` the handshake is answered with
    /// `401 Unauthorized` and [`TransportError::Unauthorized`] is returned.
    /// Otherwise the connection is returned together with whatever
    /// `admit` produced.
    pub async fn upgrade<T, F>(self, admit: F) -> Result<(WebSocketConnection, T), TransportError>
    where
        F: FnOnce(&UpgradeRequest) -> Option<T> + Unpin,
    {
        let mut admitted = None;
        let callback = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let request = upgrade_request(req);
            match admit(&request) {
                Some(value) => {
                    admitted = Some(value);
                    Ok(resp)
                }
                None => {
                    let mut reject = ErrorResponse::new(Some("unauthorized".to_owned()));
                    *reject.status_mut() = StatusCode::UNAUTHORIZED;
                    Err(reject)
                }
            }
        };

        let ws_config = WebSocketConfig::default()
            .max_frame_size(Some(self.config.max_frame_size))
            .max_message_size(Some(self.config.max_frame_size));
        let handshake = tokio_tungstenite::accept_hdr_async_with_config(
            self.stream,
            callback,
            Some(ws_config),
        )
        .await;

        let ws = match (handshake, admitted) {
            (Ok(ws), Some(value)) => (ws, value),
            (Err(_), None) | (Ok(_), None) => return Err(TransportError::Unauthorized),
            (Err(e), Some(_)) => {
                return Err(TransportError::HandshakeFailed(io_error(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                )));
            }
        };

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, addr = %self.addr, "WebSocket upgrade complete");
        Ok((WebSocketConnection::new(id, ws.0), ws.1))
    }
}

fn upgrade_request(req: &Request) -> UpgradeRequest {
    let header_value = |name: header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    UpgradeRequest {
        path: req.uri().path().to_owned(),
        query: req.uri().query().map(str::to_owned),
        authorization: header_value(header::AUTHORIZATION),
        cookie: header_value(header::COOKIE),
    }
}

/// A single WebSocket connection.
///
/// The sink and stream halves are locked independently so the read pump
/// can block in [`recv`](Connection::recv) while the write and keepalive
/// pumps send.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
    pongs: watch::Sender<u64>,
}

impl WebSocketConnection {
    fn new(id: ConnectionId, ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            pongs: watch::Sender::new(0),
        }
    }

    async fn send_message(&self, msg: Message) -> Result<(), TransportError> {
        self.sink.lock().await.send(msg).await.map_err(|e| match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                TransportError::ConnectionClosed("send after close".into())
            }
            e => TransportError::SendFailed(io_error(std::io::ErrorKind::BrokenPipe, e)),
        })
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        self.send_message(Message::text(text.to_owned())).await
    }

    async fn recv(&self) -> Result<Option<Incoming>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Incoming::Text(text.as_str().to_owned())));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Incoming::Binary(data.to_vec())));
                }
                Some(Ok(Message::Pong(_))) => {
                    self.pongs.send_modify(|n| *n += 1);
                }
                // tungstenite answers pings on its own.
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    return match frame {
                        Some(f) if !matches!(f.code, CloseCode::Normal | CloseCode::Away) => {
                            Err(TransportError::ClosedAbnormally {
                                code: u16::from(f.code),
                                reason: f.reason.as_str().to_owned(),
                            })
                        }
                        _ => Ok(None),
                    };
                }
                None | Some(Err(WsError::ConnectionClosed)) => return Ok(None),
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        let mut pongs = self.pongs.subscribe();
        self.send_message(Message::Ping(Default::default())).await?;
        pongs
            .changed()
            .await
            .map_err(|_| TransportError::ConnectionClosed("dropped while awaiting pong".into()))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        match self.sink.lock().await.close().await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(TransportError::SendFailed(io_error(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))),
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
