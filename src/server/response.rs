use serde_json::Value;

/// Standard reason phrase for the statuses the router itself produces.
pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        415 => "Unsupported Media Type",
        500 => "Internal Server Error",
        _ => "",
    }
}

/// A response body: the value plus the content types it may be encoded as,
/// in preference order.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    value: Value,
    content_types: Vec<String>,
}

impl Body {
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn content_types(&self) -> &[String] {
        &self.content_types
    }
}

/// In-memory response built by handlers and the router, rendered by the
/// adapter.
///
/// Every builder method consumes the response and returns the new one, so a
/// handler reads as a chain:
///
/// ```rust
/// use verbtree::server::response::Response;
/// use serde_json::json;
///
/// let response = Response::ok()
///     .add_header("cache-control", json!("no-store"))
///     .add_body(json!({"id": 7}), vec!["application/json".into()]);
/// assert_eq!(response.status(), 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    quiet_headers: Vec<(String, String)>,
    headers: Vec<(String, Value)>,
    body: Option<Body>,
    /// Set for `HEAD`: the body is negotiated and encoded but never sent.
    omit_payload: bool,
}

impl Response {
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            quiet_headers: Vec::new(),
            headers: Vec::new(),
            body: None,
            omit_payload: false,
        }
    }

    #[must_use]
    pub fn ok() -> Self {
        Self::empty(200)
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Attach a body; replaces any existing one.
    #[must_use]
    pub fn add_body(mut self, value: Value, content_types: Vec<String>) -> Self {
        self.body = Some(Body {
            value,
            content_types,
        });
        self
    }

    /// Set a declared header. Names are case-insensitive; a second value for
    /// the same name replaces the first.
    #[must_use]
    pub fn add_header(mut self, name: &str, value: Value) -> Self {
        let name = name.to_ascii_lowercase();
        match self.headers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Append a raw header that bypasses declaration and encoding.
    #[must_use]
    pub fn add_quiet_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.quiet_headers
            .push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Give a body that declared no content types the endpoint's defaults.
    #[must_use]
    pub(crate) fn with_default_content_types(mut self, defaults: &[String]) -> Self {
        if let Some(body) = self.body.as_mut() {
            if body.content_types.is_empty() {
                body.content_types = defaults.to_vec();
            }
        }
        self
    }

    /// Drop the body, keeping status and every header.
    #[must_use]
    pub fn delete_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// The `HEAD` form of a `GET` response: the body still drives
    /// negotiation, `Vary` and `Content-Type`, but no payload is written.
    #[must_use]
    pub fn into_head(mut self) -> Self {
        self.omit_payload = true;
        self
    }

    #[must_use]
    pub fn omits_payload(&self) -> bool {
        self.omit_payload
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn quiet_headers(&self) -> &[(String, String)] {
        &self.quiet_headers
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, Value)] {
        &self.headers
    }

    /// Declared header by (case-insensitive) name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&Value> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        u16,
        Vec<(String, String)>,
        Vec<(String, Value)>,
        Option<Body>,
    ) {
        (self.status, self.quiet_headers, self.headers, self.body)
    }
}
