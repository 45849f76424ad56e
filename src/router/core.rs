use super::error::RoutingError;
use super::verbs;
use crate::codec::CodecRegistry;
use crate::context::RequestContext;
use crate::handler::{HandlerRequest, Reply, Upgrade};
use crate::negotiation::{select_content_type, MediaType};
use crate::runtime_config::RouterConfig;
use crate::server::response::Response;
use crate::spec::{Endpoint, MethodSpec, RouteNode, SegmentMatcher};
use crate::validator::{validate_tree, RouteValidationError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Terminal result of a successful routing attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    Response(Response),
    /// Control passes to the continuation; nothing is rendered.
    Upgrade(Upgrade),
}

/// Backtracking router over an immutable, validated route tree.
///
/// `Router` is `Send + Sync` and cheap to clone; all per-request state lives in
/// the [`RequestContext`] passed to [`Router::route`].
#[derive(Debug, Clone)]
pub struct Router {
    root: Arc<RouteNode>,
    config: RouterConfig,
    codecs: Arc<CodecRegistry>,
}

impl Router {
    /// Validate `root` with the default configuration and codecs.
    pub fn new(root: RouteNode) -> Result<Self, RouteValidationError> {
        Self::with_config(root, RouterConfig::default(), CodecRegistry::default())
    }

    pub fn with_config(
        root: RouteNode,
        config: RouterConfig,
        codecs: CodecRegistry,
    ) -> Result<Self, RouteValidationError> {
        let issues = validate_tree(&root, &codecs);
        if !issues.is_empty() {
            for issue in &issues {
                error!(
                    location = %issue.location,
                    kind = %issue.kind,
                    message = %issue.message,
                    "Route tree validation issue"
                );
            }
            return Err(RouteValidationError { issues });
        }

        info!(
            backtrack = ?config.backtrack,
            emit_vary = config.emit_vary,
            codecs = ?codecs,
            "Router constructed"
        );
        Ok(Self {
            root: Arc::new(root),
            config,
            codecs: Arc::new(codecs),
        })
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    #[must_use]
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    #[must_use]
    pub fn root(&self) -> &RouteNode {
        &self.root
    }

    /// Route one request. On success the context keeps the routing state of
    /// the branch that matched (captures, header log).
    pub fn route(&self, ctx: &mut RequestContext) -> Result<Outcome, RoutingError> {
        let start = Instant::now();
        let result = self.walk(&self.root, ctx);
        let duration_us = start.elapsed().as_micros();

        match &result {
            Ok(_) => debug!(
                request_id = %ctx.request_id(),
                method = %ctx.raw_method(),
                path = %ctx.path(),
                duration_us,
                "Routing finished"
            ),
            Err(e) => warn!(
                request_id = %ctx.request_id(),
                method = %ctx.raw_method(),
                path = %ctx.path(),
                status = e.status(),
                error = %e,
                duration_us,
                "No route matched"
            ),
        }
        result
    }

    fn walk(&self, node: &RouteNode, ctx: &mut RequestContext) -> Result<Outcome, RoutingError> {
        match node {
            RouteNode::Segment { matcher, child } => {
                // Peek first so a literal mismatch leaves the cursor untouched;
                // deeper failures are rolled back by the enclosing alternatives.
                let Some(segment) = ctx.cursor().peek() else {
                    return Err(RoutingError::NotFound);
                };
                match matcher {
                    SegmentMatcher::Literal(text) => {
                        if segment != text.as_str() {
                            return Err(RoutingError::NotFound);
                        }
                        ctx.next_segment();
                    }
                    SegmentMatcher::Capture(name) => {
                        let value = segment.to_string();
                        ctx.next_segment();
                        ctx.bind_capture(Arc::clone(name), value);
                    }
                }
                self.walk(child, ctx)
            }
            RouteNode::Header {
                name,
                expected,
                child,
            } => {
                let matched = match ctx.inspect_header(name, expected.as_deref()) {
                    None => false,
                    Some(value) => expected
                        .as_deref()
                        .map_or(true, |want| value.trim().eq_ignore_ascii_case(want.trim())),
                };
                if !matched {
                    debug!(header = %name, "Header guard rejected request");
                    return Err(RoutingError::NotFound);
                }
                self.walk(child, ctx)
            }
            RouteNode::Alternatives(children) => {
                let snapshot = ctx.fork();
                let mut ignored: Option<RoutingError> = None;
                for (index, child) in children.iter().enumerate() {
                    match self.walk(child, ctx) {
                        Ok(outcome) => return Ok(outcome),
                        Err(e) if e.is_ignorable(self.config.backtrack) => {
                            debug!(alternative = index, error = %e, "Alternative failed, backtracking");
                            ctx.restore(snapshot.clone());
                            ignored = Some(match ignored {
                                Some(previous) => previous.merge_ignored(e),
                                None => e,
                            });
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(ignored.unwrap_or(RoutingError::NotFound))
            }
            RouteNode::Endpoint(endpoint) => {
                if !ctx.cursor().is_exhausted() {
                    return Err(RoutingError::NotFound);
                }
                verbs::dispatch(endpoint, ctx, |spec, ctx| self.run_method(endpoint, spec, ctx))
            }
        }
    }

    fn run_method(
        &self,
        endpoint: &Endpoint,
        spec: &MethodSpec,
        ctx: &mut RequestContext,
    ) -> Result<Outcome, RoutingError> {
        let headers = decode_headers(spec, ctx)?;
        let query = decode_query(spec, ctx)?;
        let (body, content_type) = self.decode_body(spec, ctx)?;

        info!(
            request_id = %ctx.request_id(),
            method = %spec.method,
            path = %ctx.path(),
            handler_name = %spec.handler_name,
            path_params = ?ctx.captures(),
            "Route matched"
        );

        let request = HandlerRequest {
            request_id: ctx.request_id(),
            method: spec.method.clone(),
            path: ctx.path().to_string(),
            handler_name: spec.handler_name.clone(),
            path_params: ctx.captures().clone(),
            headers,
            query,
            body,
            content_type,
            default_status: endpoint.default_status,
        };

        match spec.handler.handle(request)? {
            Reply::Response(response) => Ok(Outcome::Response(
                response.with_default_content_types(&spec.produces),
            )),
            Reply::Upgrade(upgrade) => Ok(Outcome::Upgrade(upgrade)),
        }
    }

    fn decode_body(
        &self,
        spec: &MethodSpec,
        ctx: &RequestContext,
    ) -> Result<(Option<Value>, Option<String>), RoutingError> {
        if spec.consumes.is_empty() {
            return Ok((None, None));
        }
        let empty = ctx.body().is_empty();

        let Some(content_type) = ctx.header("content-type") else {
            return if !empty {
                Err(RoutingError::UnsupportedMediaType)
            } else if spec.body_required {
                Err(RoutingError::bad_request("request body is required"))
            } else {
                Ok((None, None))
            };
        };

        if select_content_type(content_type, &spec.consumes).is_none() {
            debug!(content_type = %content_type, accepted = ?spec.consumes, "Request content type not accepted");
            return Err(RoutingError::UnsupportedMediaType);
        }
        let codec = self
            .codecs
            .find(content_type)
            .ok_or(RoutingError::UnsupportedMediaType)?;
        let essence = MediaType::parse(content_type)
            .map(|mt| mt.essence())
            .map_err(|_| RoutingError::UnsupportedMediaType)?;

        if empty {
            return if spec.body_required {
                Err(RoutingError::bad_request("request body is required"))
            } else {
                Ok((None, Some(essence)))
            };
        }

        let value = codec
            .decode(ctx.body())
            .map_err(|e| RoutingError::bad_request(e.to_string()))?;
        Ok((Some(value), Some(essence)))
    }
}

fn decode_headers(
    spec: &MethodSpec,
    ctx: &mut RequestContext,
) -> Result<HashMap<String, Value>, RoutingError> {
    let mut decoded = HashMap::with_capacity(spec.headers.len());
    for param in &spec.headers {
        match ctx.inspect_header(&param.name, None) {
            Some(raw) => {
                let value = param.kind.decode(raw).map_err(|e| {
                    RoutingError::bad_request(format!("invalid header `{}`: {e}", param.name))
                })?;
                decoded.insert(param.name.clone(), value);
            }
            None if param.required => {
                return Err(RoutingError::bad_request(format!(
                    "missing required header `{}`",
                    param.name
                )));
            }
            None => {}
        }
    }
    Ok(decoded)
}

fn decode_query(
    spec: &MethodSpec,
    ctx: &mut RequestContext,
) -> Result<HashMap<String, Value>, RoutingError> {
    let mut decoded = HashMap::with_capacity(spec.query.len());
    for param in &spec.query {
        let value = match ctx.inspect_query(&param.name) {
            Some(Some(raw)) => param.kind.decode(raw),
            Some(None) => param.kind.decode_flag(),
            None if param.required => {
                return Err(RoutingError::bad_request(format!(
                    "missing required query parameter `{}`",
                    param.name
                )));
            }
            None => continue,
        };
        let value = value.map_err(|e| {
            RoutingError::bad_request(format!("invalid query parameter `{}`: {e}", param.name))
        })?;
        decoded.insert(param.name.clone(), value);
    }
    Ok(decoded)
}
