//! Caller identity for Parlor connections.
//!
//! This crate is the boundary between the outside world's credentials
//! and the hub's notion of who is connected:
//!
//! 1. **Credentials**: the token found on the upgrade request
//!    ([`Credentials::from_request_parts`])
//! 2. **Authentication**: turning that token into an [`Identity`]
//!    ([`Authenticator`] trait, [`TokenTable`] implementation)
//!
//! # How it fits in the stack
//!
//! ```text
//! Transport (upgrade request) → Session (Identity) → Hub / Room
//! ```

mod auth;
mod error;
mod identity;

pub use auth::{Authenticator, TokenTable};
pub use error::SessionError;
pub use identity::{ACCESS_TOKEN_COOKIE, Credentials, Identity, TOKEN_QUERY_PARAM};
