//! # verbtree
//!
//! **verbtree** is a request-routing and response-negotiation engine for HTTP
//! services. You describe the API as a tree of path segments, header guards,
//! alternatives and endpoints; verbtree matches each request against it by
//! backtracking, derives `HEAD` and `OPTIONS` from the declared methods, and
//! renders a negotiated response or the precise `404`/`405`/`415`/`406` that
//! explains why it could not.
//!
//! ## Architecture
//!
//! - **[`context`]** - per-request state: the immutable request and the forkable routing cursor
//! - **[`spec`]** - the route tree, its builders and the YAML/JSON route document loader
//! - **[`validator`]** - construction-time checks that keep bad trees out of service
//! - **[`router`]** - the backtracking walk, verb dispatch and routing errors
//! - **[`handler`]** - the handler contract, replies, upgrades and the handler registry
//! - **[`codec`]** - header/query value kinds and request/response body codecs
//! - **[`negotiation`]** - `Accept` and `Content-Type` negotiation
//! - **[`server`]** - the `http` crate adapter: request parsing, response building and rendering
//! - **[`runtime_config`]** - router behavior from the environment
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Host as Host transport
//!     participant Service as AppService
//!     participant Router as Router
//!     participant Handler as Handler
//!     participant Render as render_response
//!
//!     Host->>Service: http::Request (body fully read)
//!     Service->>Service: parse_request → RequestContext
//!     Service->>Router: route(&mut ctx)
//!     loop each alternative
//!         Router->>Router: fork state, match segments / guards
//!         alt ignorable failure
//!             Router->>Router: restore state, try next
//!         end
//!     end
//!     Router->>Handler: HandlerRequest (decoded headers, query, body)
//!     Handler-->>Router: Reply or RoutingError
//!     alt Reply::Upgrade
//!         Router-->>Service: Outcome::Upgrade
//!         Service-->>Host: continuation's response
//!     else Reply::Response
//!         Router-->>Service: Outcome::Response
//!         Service->>Render: negotiate Accept, encode body
//!         Render-->>Host: http::Response<Vec<u8>>
//!     else RoutingError
//!         Service-->>Host: 404 / 400 / 405 / 415
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use verbtree::prelude::*;
//! use http::Method;
//! use serde_json::json;
//!
//! let tree = alternatives(vec![
//!     path("/", Endpoint::new()
//!         .with_method(MethodSpec::new(Method::GET, |req| {
//!             Ok(req.respond()
//!                 .add_header("cache-control", json!("foo"))
//!                 .add_body(json!("Hello"), vec!["text/plain".into()])
//!                 .into())
//!         }))
//!         .into_node()),
//! ]);
//!
//! let service = AppService::new(Router::new(tree).unwrap());
//!
//! let get = service.call(http::Request::get("/").body(Vec::new()).unwrap());
//! assert_eq!(get.status(), 200);
//! assert_eq!(get.body(), b"Hello");
//!
//! let options = service.call(http::Request::options("/").body(Vec::new()).unwrap());
//! assert_eq!(options.headers()["allow"], "GET,HEAD,OPTIONS");
//! ```

pub mod codec;
pub mod context;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod negotiation;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod spec;
pub mod validator;

pub use context::RequestContext;
pub use handler::{Handler, HandlerRegistry, HandlerRequest, Reply, Upgrade};
pub use router::{AllowedMethods, Outcome, Router, RoutingError};
pub use runtime_config::{BacktrackPolicy, RouterConfig};
pub use server::{AppService, Response};
pub use validator::{RouteValidationError, ValidationIssue};

/// Everything needed to declare routes and write handlers.
pub mod prelude {
    pub use crate::codec::{CodecRegistry, ValueKind};
    pub use crate::context::RequestContext;
    pub use crate::handler::{HandlerRegistry, HandlerRequest, Reply, Upgrade};
    pub use crate::router::{Outcome, Router, RoutingError};
    pub use crate::runtime_config::{BacktrackPolicy, RouterConfig};
    pub use crate::server::{AppService, Response};
    pub use crate::spec::{
        alternatives, capture, header_guard, literal, path, Endpoint, MethodSpec, ParamSpec,
        RouteNode,
    };
}
