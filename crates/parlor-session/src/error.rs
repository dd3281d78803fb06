//! Error types for the session layer.

/// Errors raised while resolving a connecting caller to an identity.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The upgrade request carried no bearer token, cookie or query token.
    #[error("missing credentials")]
    MissingCredentials,

    /// The [`Authenticator`](crate::Authenticator) rejected the token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A token table specification could not be parsed.
    #[error("malformed token entry: {0}")]
    MalformedTokens(String),
}
