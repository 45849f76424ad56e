//! Constructors for route trees.
//!
//! ```rust
//! use verbtree::spec::{alternatives, path, Endpoint, MethodSpec};
//! use verbtree::server::response::Response;
//! use http::Method;
//!
//! let tree = alternatives(vec![
//!     path("/pets", Endpoint::new()
//!         .with_method(MethodSpec::new(Method::GET, |req| Ok(req.respond().into())))
//!         .into_node()),
//!     path("/pets/{id}", Endpoint::new()
//!         .with_method(MethodSpec::new(Method::DELETE, |_req| Ok(Response::empty(204).into())))
//!         .into_node()),
//! ]);
//! # let _ = tree;
//! ```

use super::types::{Endpoint, MethodSpec, ParamSpec, RouteNode, SegmentMatcher};
use crate::codec::ValueKind;
use crate::handler::{handler_fn, Handler, HandlerRequest, Reply};
use crate::router::RoutingError;
use http::Method;
use std::sync::Arc;

#[must_use]
pub fn literal(text: &str, child: RouteNode) -> RouteNode {
    RouteNode::Segment {
        matcher: SegmentMatcher::Literal(text.to_string()),
        child: Box::new(child),
    }
}

#[must_use]
pub fn capture(name: &str, child: RouteNode) -> RouteNode {
    RouteNode::Segment {
        matcher: SegmentMatcher::Capture(Arc::from(name)),
        child: Box::new(child),
    }
}

#[must_use]
pub fn header_guard(name: &str, expected: Option<&str>, child: RouteNode) -> RouteNode {
    RouteNode::Header {
        name: name.to_ascii_lowercase(),
        expected: expected.map(str::to_string),
        child: Box::new(child),
    }
}

#[must_use]
pub fn alternatives(children: Vec<RouteNode>) -> RouteNode {
    RouteNode::Alternatives(children)
}

/// Nest `leaf` under the segments of a template such as `/users/{id}/posts`.
/// `{name}` segments become captures; `/` alone is the leaf itself.
#[must_use]
pub fn path(template: &str, leaf: RouteNode) -> RouteNode {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .rev()
        .fold(leaf, |child, segment| {
            match segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                Some(name) => capture(name, child),
                None => literal(segment, child),
            }
        })
}

impl Endpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    #[must_use]
    pub fn with_default_status(mut self, status: u16) -> Self {
        self.default_status = status;
        self
    }

    #[must_use]
    pub fn into_node(self) -> RouteNode {
        RouteNode::Endpoint(self)
    }
}

impl MethodSpec {
    /// A method with no declared headers, query or body, producing `text/plain`
    /// and `application/json`.
    pub fn new<F>(method: Method, f: F) -> Self
    where
        F: Fn(HandlerRequest) -> Result<Reply, RoutingError> + Send + Sync + 'static,
    {
        Self::with_handler(method, handler_fn(f))
    }

    pub fn with_handler(method: Method, handler: Arc<dyn Handler>) -> Self {
        Self {
            handler_name: method.as_str().to_ascii_lowercase(),
            method,
            headers: Vec::new(),
            query: Vec::new(),
            consumes: Vec::new(),
            body_required: false,
            produces: vec!["text/plain".to_string(), "application/json".to_string()],
            handler,
        }
    }

    #[must_use]
    pub fn named(mut self, handler_name: &str) -> Self {
        self.handler_name = handler_name.to_string();
        self
    }

    #[must_use]
    pub fn header(mut self, mut param: ParamSpec) -> Self {
        param.name = param.name.to_ascii_lowercase();
        self.headers.push(param);
        self
    }

    #[must_use]
    pub fn query(mut self, param: ParamSpec) -> Self {
        self.query.push(param);
        self
    }

    #[must_use]
    pub fn consumes(mut self, content_types: &[&str]) -> Self {
        self.consumes = content_types.iter().map(|s| s.to_string()).collect();
        self
    }

    #[must_use]
    pub fn body_required(mut self, required: bool) -> Self {
        self.body_required = required;
        self
    }

    #[must_use]
    pub fn produces(mut self, content_types: &[&str]) -> Self {
        self.produces = content_types.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Shorthand for a required header of kind [`ValueKind::Text`].
    #[must_use]
    pub fn require_header(self, name: &str) -> Self {
        self.header(ParamSpec::required(name, ValueKind::Text))
    }
}
