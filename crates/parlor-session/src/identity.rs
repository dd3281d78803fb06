//! Who a connection belongs to, and the raw credentials it presented.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// A verified caller. The hub and rooms only ever see this, never the
/// credentials it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable account id. Used for game seats and as the envelope sender.
    pub user_id: String,
    /// Name shown in member lists and status lines.
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.user_id)
    }
}

/// Name of the cookie that may carry the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Name of the query parameter that may carry the access token.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// A token extracted from an upgrade request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Picks the token out of the request parts, in order of preference:
    /// `Authorization: Bearer <token>`, the `access_token` cookie, then
    /// the `token` query parameter. Empty values are ignored.
    pub fn from_request_parts(
        authorization: Option<&str>,
        cookie: Option<&str>,
        query: Option<&str>,
    ) -> Option<Self> {
        let bearer = authorization
            .and_then(|value| value.trim().strip_prefix("Bearer "))
            .map(str::trim);
        let from_cookie = cookie.and_then(|header| {
            header.split(';').find_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (name == ACCESS_TOKEN_COOKIE).then_some(value)
            })
        });
        if let Some(token) = [bearer, from_cookie].into_iter().flatten().find(|t| !t.is_empty()) {
            return Some(Self::new(token));
        }
        query.and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(name, value)| name == TOKEN_QUERY_PARAM && !value.is_empty())
                .map(|(_, value)| Self::new(value))
        })
    }
}

// Tokens never appear in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_request_parts_bearer_header() {
        let creds = Credentials::from_request_parts(Some("Bearer abc"), None, None).unwrap();
        assert_eq!(creds.token(), "abc");
    }

    #[test]
    fn test_from_request_parts_cookie() {
        let creds = Credentials::from_request_parts(
            None,
            Some("theme=dark; access_token=xyz; other=1"),
            None,
        )
        .unwrap();
        assert_eq!(creds.token(), "xyz");
    }

    #[test]
    fn test_from_request_parts_query() {
        let creds = Credentials::from_request_parts(None, None, Some("room=a&token=q1")).unwrap();
        assert_eq!(creds.token(), "q1");
    }

    #[test]
    fn test_from_request_parts_query_percent_decoded() {
        let creds =
            Credentials::from_request_parts(None, None, Some("token=abc%3D%3D&room=a+b")).unwrap();
        assert_eq!(creds.token(), "abc==");
    }

    #[test]
    fn test_from_request_parts_header_wins_over_query() {
        let creds =
            Credentials::from_request_parts(Some("Bearer head"), None, Some("token=query")).unwrap();
        assert_eq!(creds.token(), "head");
    }

    #[test]
    fn test_from_request_parts_non_bearer_scheme_falls_through() {
        let creds =
            Credentials::from_request_parts(Some("Basic dXNlcg=="), None, Some("token=q")).unwrap();
        assert_eq!(creds.token(), "q");
    }

    #[test]
    fn test_from_request_parts_empty_token_none() {
        assert!(Credentials::from_request_parts(Some("Bearer "), None, Some("token=")).is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let creds = Credentials::new("secret");
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
