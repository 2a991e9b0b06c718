//! Session identifier extraction from inbound requests.
//!
//! The identifier is read from the `X-Session-Id` header first and the
//! `session_id` query parameter second. When the parameter repeats, its last
//! occurrence wins.

use actix_web::http::header::{HeaderMap, HeaderName};
use url::form_urlencoded;

/// Header carrying the client session identifier.
pub const SESSION_ID_HEADER: HeaderName = HeaderName::from_static("x-session-id");

/// Query parameter carrying the client session identifier.
pub const SESSION_ID_QUERY_PARAM: &str = "session_id";

/// How an empty `X-Session-Id` header is treated.
///
/// An empty `session_id` query value is always stored as `""`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptySessionId {
    /// An empty header counts as absent and extraction falls through to the
    /// query parameter.
    #[default]
    Ignore,
    /// An empty header is stored as `""`.
    Keep,
}

/// Reads the session identifier from request headers and query string.
///
/// # Examples
/// ```
/// use actix_web::http::header::{HeaderMap, HeaderValue};
/// use synthgen::middleware::{SESSION_ID_HEADER, SessionIdExtractor};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("H1"));
///
/// let extractor = SessionIdExtractor::default();
/// assert_eq!(
///     extractor.extract(&headers, "session_id=Q1").as_deref(),
///     Some("H1")
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionIdExtractor {
    empty: EmptySessionId,
}

impl SessionIdExtractor {
    /// Create an extractor applying the given empty-value policy.
    #[must_use]
    pub const fn new(empty: EmptySessionId) -> Self {
        Self { empty }
    }

    /// Policy applied to empty values.
    #[must_use]
    pub const fn empty_policy(&self) -> EmptySessionId {
        self.empty
    }

    /// Extract the session identifier, or `None` when no source supplies one.
    ///
    /// Header bytes are decoded as Latin-1, so opaque values are kept rather
    /// than dropped.
    #[must_use]
    pub fn extract(&self, headers: &HeaderMap, query: &str) -> Option<String> {
        self.from_header(headers).or_else(|| Self::from_query(query))
    }

    fn from_header(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(&SESSION_ID_HEADER)?;
        match self.empty {
            EmptySessionId::Ignore if value.is_empty() => None,
            EmptySessionId::Ignore | EmptySessionId::Keep => Some(latin1(value.as_bytes())),
        }
    }

    fn from_query(query: &str) -> Option<String> {
        form_urlencoded::parse(query.as_bytes())
            .filter(|(name, _)| name == SESSION_ID_QUERY_PARAM)
            .last()
            .map(|(_, value)| value.into_owned())
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}
