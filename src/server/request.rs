use crate::context::RequestContext;
use crate::ids::RequestId;
use bytes::Bytes;
use tracing::{debug, info};

/// Read a complete `http::Request` into a [`RequestContext`].
///
/// Header values that are not valid UTF-8 are decoded lossily. The body is
/// taken whole, so routing can inspect it as often as it needs to.
pub fn parse_request<B: Into<Bytes>>(req: http::Request<B>) -> RequestContext {
    let (parts, body) = req.into_parts();
    let target = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());

    let request_id = RequestId::from_headers(&parts.headers);

    let mut ctx = RequestContext::new(parts.method.as_str(), target).with_request_id(request_id);
    let mut size_bytes = 0usize;
    for (name, value) in &parts.headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        size_bytes += name.as_str().len() + value.len();
        ctx = ctx.with_header(name.as_str(), &value);
    }
    debug!(
        request_id = %request_id,
        header_count = ctx.headers().len(),
        size_bytes,
        header_names = ?ctx.headers().keys().take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );
    debug!(
        request_id = %request_id,
        param_count = ctx.query().len(),
        "Query params parsed"
    );

    let body: Bytes = body.into();
    if !body.is_empty() {
        info!(
            request_id = %request_id,
            content_length = body.len(),
            content_type = ctx.header("content-type").unwrap_or(""),
            "Request body read"
        );
    }
    ctx.with_body(body)
}
