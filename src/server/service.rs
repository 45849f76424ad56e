use super::request::parse_request;
use super::response::{status_reason, Response};
use crate::codec::{encode_value, CodecRegistry};
use crate::context::RequestContext;
use crate::negotiation::negotiate;
use crate::router::{Outcome, Router, RoutingError};
use arc_swap::ArcSwap;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, VARY};
use http::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Adapter between `http` requests and a [`Router`].
///
/// Clones share the same router slot, so [`AppService::replace_router`] on one
/// clone is seen by all of them. Requests already in flight finish on the
/// router they started with.
#[derive(Clone)]
pub struct AppService {
    router: Arc<ArcSwap<Router>>,
}

impl AppService {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(ArcSwap::from_pointee(router)),
        }
    }

    /// The router currently serving requests.
    #[must_use]
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    /// Atomically swap in a new route table.
    pub fn replace_router(&self, router: Router) {
        self.router.store(Arc::new(router));
        info!("Router replaced");
    }

    /// Route and render one request.
    pub fn call<B: Into<Bytes>>(&self, req: http::Request<B>) -> http::Response<Vec<u8>> {
        let mut ctx = parse_request(req);
        self.respond(&mut ctx)
    }

    /// Route and render an already-built context.
    pub fn respond(&self, ctx: &mut RequestContext) -> http::Response<Vec<u8>> {
        let start = Instant::now();
        let router = self.router.load_full();

        let response = match router.route(ctx) {
            Ok(Outcome::Response(response)) => {
                let vary = router
                    .config()
                    .emit_vary
                    .then(|| vary_for(ctx, &response))
                    .flatten();
                render_response(
                    response,
                    ctx.header("accept"),
                    router.codecs(),
                    vary.as_deref(),
                )
            }
            Ok(Outcome::Upgrade(upgrade)) => {
                info!(request_id = %ctx.request_id(), path = %ctx.path(), "Handing request to upgrade");
                upgrade.run(ctx)
            }
            Err(e) => render_error(&e),
        };

        info!(
            request_id = %ctx.request_id(),
            method = %ctx.raw_method(),
            path = %ctx.path(),
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "Request completed"
        );
        response
    }
}

/// `Vary` for a successful response: every header routing inspected on the
/// winning branch, plus `accept` when the body could be encoded more than one
/// way. `None` when nothing varies.
#[must_use]
pub fn vary_for(ctx: &RequestContext, response: &Response) -> Option<String> {
    let mut names: Vec<&str> = ctx.state().header_log().keys().map(String::as_str).collect();
    if response.body().is_some_and(|b| b.content_types().len() > 1) && !names.contains(&"accept") {
        names.push("accept");
    }
    (!names.is_empty()).then(|| names.join(", "))
}

fn bare(status: u16) -> http::Response<Vec<u8>> {
    let mut response = http::Response::new(Vec::new());
    *response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
}

fn append(response: &mut http::Response<Vec<u8>>, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            response.headers_mut().append(name, value);
        }
        _ => warn!(header = %name, "Skipping header that is not valid on the wire"),
    }
}

/// Render a [`Response`]: quiet headers, then declared headers, then `Vary`,
/// then the negotiated `Content-Type` with the encoded body.
///
/// Fails over to `406` when no declared content type is acceptable and to
/// `500` when the body cannot be encoded. A `HEAD` response goes through the
/// same steps and only leaves the payload out.
#[must_use]
pub fn render_response(
    response: Response,
    accept: Option<&str>,
    codecs: &CodecRegistry,
    vary: Option<&str>,
) -> http::Response<Vec<u8>> {
    let omit_payload = response.omits_payload();
    let (status, quiet_headers, headers, body) = response.into_parts();

    let encoded = match &body {
        None => None,
        Some(body) => {
            let Ok(content_type) = negotiate(accept, body.content_types()) else {
                debug!(accept = ?accept, offered = ?body.content_types(), "No acceptable content type");
                return bare(406);
            };
            let Some(codec) = codecs.find(content_type) else {
                error!(content_type = %content_type, "No codec registered for negotiated content type");
                return bare(500);
            };
            match codec.encode(body.value()) {
                Ok(bytes) => Some((content_type.to_string(), bytes)),
                Err(e) => {
                    error!(content_type = %content_type, error = %e, "Failed to encode response body");
                    return bare(500);
                }
            }
        }
    };

    let mut out = bare(status);
    for (name, value) in &quiet_headers {
        append(&mut out, name, value);
    }
    for (name, value) in &headers {
        append(&mut out, name, &encode_value(value));
    }
    if let Some(vary) = vary {
        append(&mut out, VARY.as_str(), vary);
    }
    if let Some((content_type, bytes)) = encoded {
        append(&mut out, CONTENT_TYPE.as_str(), &content_type);
        if !omit_payload {
            *out.body_mut() = bytes;
        }
    }
    debug!(status, reason = status_reason(status), "Response rendered");
    out
}

/// Render a routing failure. Error bodies are never negotiated: a
/// `BadRequest` message is written as-is under `text/plain`, whatever codecs
/// the router was built with.
#[must_use]
pub fn render_error(error: &RoutingError) -> http::Response<Vec<u8>> {
    let (status, quiet_headers, _, body) = error.to_response().into_parts();
    let mut out = bare(status);
    for (name, value) in &quiet_headers {
        append(&mut out, name, value);
    }
    if let Some(body) = body {
        append(&mut out, CONTENT_TYPE.as_str(), "text/plain");
        *out.body_mut() = encode_value(body.value()).into_bytes();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use serde_json::json;

    #[test]
    fn test_render_orders_headers() {
        let response = Response::ok()
            .add_header("cache-control", json!("foo"))
            .add_quiet_header("x-quiet", "1")
            .add_body(json!({"a": 1}), vec!["application/json".into()]);
        let out = render_response(response, None, &CodecRegistry::default(), Some("accept"));
        let names: Vec<&str> = out.headers().keys().map(|k| k.as_str()).collect();
        assert_eq!(names, ["x-quiet", "cache-control", "vary", "content-type"]);
        assert_eq!(out.body(), br#"{"a":1}"#);
    }

    #[test]
    fn test_render_not_acceptable() {
        let response = Response::ok().add_body(json!("x"), vec!["text/plain".into()]);
        let out = render_response(response, Some("application/json"), &CodecRegistry::default(), None);
        assert_eq!(out.status(), 406);
        assert!(out.body().is_empty());
    }

    #[test]
    fn test_render_encode_failure_is_server_error() {
        let response = Response::ok().add_body(
            json!([1, 2]),
            vec!["application/x-www-form-urlencoded".into()],
        );
        let out = render_response(response, None, &CodecRegistry::default(), None);
        assert_eq!(out.status(), 500);
    }

    #[test]
    fn test_render_error_bodies() {
        let out = render_error(&RoutingError::bad_request("missing header `x`"));
        assert_eq!(out.status(), 400);
        assert_eq!(out.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(out.body(), b"missing header `x`");

        let out = render_error(&RoutingError::BadRequest(None));
        assert!(out.body().is_empty());
        assert!(out.headers().get(CONTENT_TYPE).is_none());

        let out = render_error(
            &RoutingError::MethodNotAllowed(crate::router::AllowedMethods::new([Method::GET])),
        );
        assert_eq!(out.status(), 405);
        assert_eq!(out.headers()[http::header::ALLOW], "GET");
    }

    #[test]
    fn test_head_render_matches_get_without_payload() {
        let get = Response::ok()
            .add_header("cache-control", json!("foo"))
            .add_body(json!({"a": 1}), vec!["application/json".into(), "text/plain".into()]);
        let head = get.clone().into_head();
        let codecs = CodecRegistry::default();

        let get_out = render_response(get.clone(), None, &codecs, Some("accept"));
        let head_out = render_response(head.clone(), None, &codecs, Some("accept"));
        assert_eq!(head_out.status(), get_out.status());
        assert_eq!(head_out.headers(), get_out.headers());
        assert_eq!(head_out.headers()[CONTENT_TYPE], "application/json");
        assert!(head_out.body().is_empty());
        assert!(!get_out.body().is_empty());

        let get_out = render_response(get, Some("image/png"), &codecs, None);
        let head_out = render_response(head, Some("image/png"), &codecs, None);
        assert_eq!(get_out.status(), 406);
        assert_eq!(head_out.status(), 406);
    }

    #[test]
    fn test_vary_from_header_log() {
        let mut ctx = RequestContext::new("GET", "/").with_header("x-api-version", "2");
        ctx.inspect_header("x-api-version", Some("2"));
        let single = Response::ok().add_body(json!("x"), vec!["text/plain".into()]);
        assert_eq!(vary_for(&ctx, &single).as_deref(), Some("x-api-version"));

        let multi = Response::ok().add_body(
            json!("x"),
            vec!["text/plain".into(), "application/json".into()],
        );
        assert_eq!(vary_for(&ctx, &multi).as_deref(), Some("x-api-version, accept"));

        let plain = RequestContext::new("GET", "/");
        assert_eq!(vary_for(&plain, &single), None);
    }
}
