//! Authentication hook for connecting callers.
//!
//! Parlor does not issue or validate credentials itself. The
//! [`Authenticator`] trait is the boundary: it turns the token found on
//! the upgrade request into a verified [`Identity`], or rejects it, in
//! which case the HTTP handshake is answered with `401` and no
//! connection is ever created.
//!
//! [`TokenTable`] is a static in-memory implementation for development
//! deployments and tests.

use std::collections::HashMap;

use crate::{Credentials, Identity, SessionError};

/// Resolves credentials to an identity.
///
/// Called on the connection's accept path, before the WebSocket upgrade
/// completes, so implementations must not block for long.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, credentials: &Credentials) -> Result<Identity, SessionError>;
}

/// Fixed token → identity map.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    tokens: HashMap<String, Identity>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.insert(token, identity);
        self
    }

    /// Parses `token=user_id:Display Name` entries separated by commas.
    ///
    /// The display name defaults to the user id when omitted.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let mut table = Self::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (token, who) = entry
                .split_once('=')
                .ok_or_else(|| SessionError::MalformedTokens(entry.to_owned()))?;
            let (user_id, display_name) = who.split_once(':').unwrap_or((who, who));
            if token.is_empty() || user_id.is_empty() {
                return Err(SessionError::MalformedTokens(entry.to_owned()));
            }
            table.insert(token, Identity::new(user_id, display_name));
        }
        tracing::debug!(entries = table.len(), "token table loaded");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for TokenTable {
    fn authenticate(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        self.tokens
            .get(credentials.token())
            .cloned()
            .ok_or_else(|| SessionError::AuthFailed("unknown token".into()))
    }
}
