use crate::codec::ValueKind;
use crate::handler::Handler;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// How a path segment node matches the next request segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentMatcher {
    /// Exact, case-sensitive text.
    Literal(String),
    /// Any segment, bound under this name.
    Capture(Arc<str>),
}

/// One node of the route tree.
#[derive(Debug, Clone)]
pub enum RouteNode {
    Segment {
        matcher: SegmentMatcher,
        child: Box<RouteNode>,
    },
    /// Descend only if the request carries `name` (equal to `expected`, when given).
    Header {
        name: String,
        expected: Option<String>,
        child: Box<RouteNode>,
    },
    /// Children tried left to right.
    Alternatives(Vec<RouteNode>),
    Endpoint(Endpoint),
}

/// A leaf binding methods to handlers.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub methods: Vec<MethodSpec>,
    pub default_status: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            default_status: 200,
        }
    }
}

impl Endpoint {
    #[must_use]
    pub fn method(&self, method: &Method) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| &m.method == method)
    }
}

/// A declared header or query parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub required: bool,
    pub kind: ValueKind,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            required: true,
            kind,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            required: false,
            kind,
        }
    }
}

/// Everything declared for one method of an endpoint.
#[derive(Clone)]
pub struct MethodSpec {
    pub method: Method,
    pub handler_name: String,
    /// Header names are stored lower-case.
    pub headers: Vec<ParamSpec>,
    pub query: Vec<ParamSpec>,
    /// Accepted request content types; empty means the method takes no body.
    pub consumes: Vec<String>,
    pub body_required: bool,
    /// Content types the handler's bodies may be encoded as.
    pub produces: Vec<String>,
    pub handler: Arc<dyn Handler>,
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("method", &self.method)
            .field("handler_name", &self.handler_name)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("consumes", &self.consumes)
            .field("body_required", &self.body_required)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}
