/// Errors that can occur in the transport layer.
///
/// Every variant is fatal to the connection that produced it and to
/// nothing else.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed with a code other than normal or going-away.
    #[error("connection closed abnormally ({code}): {reason}")]
    ClosedAbnormally { code: u16, reason: String },

    /// The connection is already closed.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting TCP connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The WebSocket handshake failed.
    #[error("handshake failed: {0}")]
    HandshakeFailed(#[source] std::io::Error),

    /// The upgrade request was refused by the admission check.
    #[error("upgrade rejected: unauthorized")]
    Unauthorized,
}
