//! # Handler Module
//!
//! The contract between the router and application code.
//!
//! Once a request has matched an endpoint and its declared headers, query
//! parameters and body have been decoded, the router hands a [`HandlerRequest`]
//! to the method's [`Handler`]. The handler answers with a [`Reply`] (a
//! [`Response`] to negotiate and render, or an [`Upgrade`] that takes over the
//! connection) or with a [`RoutingError`]. Returning [`RoutingError::NotFound`]
//! lets the router fall through to the next alternative.
//!
//! A [`HandlerRegistry`] maps handler names to implementations so that route
//! documents can refer to handlers by name.

use crate::context::{ParamVec, RequestContext};
use crate::ids::RequestId;
use crate::router::RoutingError;
use crate::server::response::Response;
use http::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Application code bound to one method of an endpoint.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: HandlerRequest) -> Result<Reply, RoutingError>;
}

impl<F> Handler for F
where
    F: Fn(HandlerRequest) -> Result<Reply, RoutingError> + Send + Sync + 'static,
{
    fn handle(&self, request: HandlerRequest) -> Result<Reply, RoutingError> {
        self(request)
    }
}

/// Wrap a closure as a shareable handler, fixing its argument type for inference.
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(HandlerRequest) -> Result<Reply, RoutingError> + Send + Sync + 'static,
{
    Arc::new(f)
}

type UpgradeFn = dyn Fn(&RequestContext) -> http::Response<Vec<u8>> + Send + Sync;

/// Continuation that produces the wire response itself, bypassing rendering
/// (protocol switches such as WebSocket handshakes).
#[derive(Clone)]
pub struct Upgrade(Arc<UpgradeFn>);

impl Upgrade {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> http::Response<Vec<u8>> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn run(&self, ctx: &RequestContext) -> http::Response<Vec<u8>> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Upgrade(..)")
    }
}

/// What a handler produces on success.
#[derive(Debug, Clone)]
pub enum Reply {
    Response(Response),
    Upgrade(Upgrade),
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

impl From<Upgrade> for Reply {
    fn from(upgrade: Upgrade) -> Self {
        Reply::Upgrade(upgrade)
    }
}

/// Decoded request data handed to a handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    pub handler_name: String,
    /// Captured path segments in capture order.
    pub path_params: ParamVec,
    /// Declared headers that were present, keyed by lower-case name.
    pub headers: HashMap<String, Value>,
    /// Declared query parameters that were present.
    pub query: HashMap<String, Value>,
    pub body: Option<Value>,
    /// Essence of the request content type the body was decoded as.
    pub content_type: Option<String>,
    /// Status of the endpoint, used by [`HandlerRequest::respond`].
    pub default_status: u16,
}

impl HandlerRequest {
    /// Get a path parameter by name.
    ///
    /// Last write wins: with `/org/{id}/user/{id}` this returns the user id.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Case-insensitive lookup of a declared header.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&Value> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// An empty response carrying the endpoint's default status.
    #[must_use]
    pub fn respond(&self) -> Response {
        Response::empty(self.default_status)
    }
}

/// Handlers by name, consulted when a route document is loaded.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one.
    pub fn register(&mut self, name: &str, handler: Arc<dyn Handler>) {
        if self.handlers.insert(name.to_string(), handler).is_some() {
            warn!(
                handler_name = %name,
                total_handlers = self.handlers.len(),
                "Replaced existing handler"
            );
        } else {
            info!(
                handler_name = %name,
                total_handlers = self.handlers.len(),
                "Handler registered successfully"
            );
        }
    }

    pub fn register_fn<F>(&mut self, name: &str, f: F)
    where
        F: Fn(HandlerRequest) -> Result<Reply, RoutingError> + Send + Sync + 'static,
    {
        self.register(name, handler_fn(f));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
