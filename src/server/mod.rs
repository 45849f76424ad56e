//! # Server Module
//!
//! The boundary between the `http` crate's request/response types and the
//! router. Transport (sockets, TLS, connection reuse) stays with the host: it
//! hands a fully-read `http::Request` to [`AppService::call`] and writes back
//! the `http::Response<Vec<u8>>` it returns.
//!
//! - [`request`] turns an `http::Request` into a [`RequestContext`](crate::context::RequestContext).
//! - [`response`] is the immutable [`Response`](response::Response) builder handlers use.
//! - [`service`] routes, negotiates and renders.

pub mod request;
pub mod response;
pub mod service;

pub use request::parse_request;
pub use response::{Body, Response};
pub use service::{render_error, render_response, vary_for, AppService};
