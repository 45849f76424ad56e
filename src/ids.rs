use http::HeaderMap;
use std::fmt;
use ulid::Ulid;

/// Header a client (or an upstream proxy) may use to propagate its own request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id for the log events of one routed request. Never consulted
/// by routing itself.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// A ULID in canonical text form; surrounding whitespace is ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Ulid::from_string(raw.trim()).ok().map(Self)
    }

    /// The id propagated in `x-request-id`, or a fresh one when the header is
    /// missing, not UTF-8 or not a ULID.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
