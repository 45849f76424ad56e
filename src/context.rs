//! # Request Context
//!
//! [`RequestContext`] pairs the immutable request (method, headers, query,
//! fully-read body) with the mutable [`RoutingState`] the router threads through
//! its traversal: the path cursor, captured path parameters and the header and
//! query access logs.
//!
//! Backtracking is snapshot-and-restore: [`RequestContext::fork`] clones the
//! routing state, and [`RequestContext::restore`] puts a snapshot back, so a
//! failed alternative never leaks cursor movement, captures or log entries into
//! the next one.

use crate::ids::RequestId;
use bytes::Bytes;
use http::Method;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Maximum number of captured path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured path parameters, in capture order.
///
/// Names come from the static route tree, so they are `Arc<str>` and cloning a
/// snapshot only bumps reference counts.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Zipper over the decoded path segments.
///
/// The segment list is shared and never changes; only the split point moves,
/// so `consumed() ++ remaining()` is always the original path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCursor {
    segments: Arc<[String]>,
    position: usize,
}

impl PathCursor {
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self {
            segments: segments.into(),
            position: 0,
        }
    }

    /// Split a request path into percent-decoded segments. Empty segments
    /// (`//`, a trailing `/`) are dropped.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        Self::new(split_path(path))
    }

    #[must_use]
    pub fn consumed(&self) -> &[String] {
        &self.segments[..self.position]
    }

    #[must_use]
    pub fn remaining(&self) -> &[String] {
        &self.segments[self.position..]
    }

    #[must_use]
    pub fn original(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.segments.len()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&str> {
        self.segments.get(self.position).map(String::as_str)
    }

    /// Move one segment from `remaining` to `consumed`.
    pub fn advance(&mut self) -> Option<&str> {
        let segment = self.segments.get(self.position)?;
        self.position += 1;
        Some(segment.as_str())
    }
}

/// Everything the router may change while walking the route tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingState {
    cursor: PathCursor,
    captures: ParamVec,
    header_log: BTreeMap<String, Option<String>>,
    query_log: BTreeSet<String>,
}

impl RoutingState {
    fn new(cursor: PathCursor) -> Self {
        Self {
            cursor,
            captures: ParamVec::new(),
            header_log: BTreeMap::new(),
            query_log: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn cursor(&self) -> &PathCursor {
        &self.cursor
    }

    #[must_use]
    pub fn captures(&self) -> &ParamVec {
        &self.captures
    }

    /// Header name → the value routing expected it to have, if any.
    #[must_use]
    pub fn header_log(&self) -> &BTreeMap<String, Option<String>> {
        &self.header_log
    }

    #[must_use]
    pub fn query_log(&self) -> &BTreeSet<String> {
        &self.query_log
    }
}

/// One in-flight request as seen by the router.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Option<Method>,
    raw_method: String,
    path: String,
    headers: HashMap<String, String>,
    query: HashMap<String, Option<String>>,
    body: Bytes,
    state: RoutingState,
}

impl RequestContext {
    /// Build a context from the wire method and request target (`/path?query`).
    ///
    /// A method that is not a valid token is kept only as its raw string and
    /// never matches a declared method.
    #[must_use]
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };
        let path = if path.is_empty() { "/" } else { path };
        Self {
            request_id: RequestId::new(),
            method: Method::from_bytes(method.as_bytes()).ok(),
            raw_method: method.to_string(),
            path: path.to_string(),
            headers: HashMap::new(),
            query: parse_query(query),
            body: Bytes::new(),
            state: RoutingState::new(PathCursor::from_path(path)),
        }
    }

    /// Add a header; names are case-insensitive and repeated headers are
    /// joined with `", "`.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    #[must_use]
    pub fn raw_method(&self) -> &str {
        &self.raw_method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Read a header without recording the access.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// `None` when the key is absent, `Some(None)` for a bare `?key`.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<Option<&str>> {
        self.query.get(key).map(|v| v.as_deref())
    }

    #[must_use]
    pub fn query(&self) -> &HashMap<String, Option<String>> {
        &self.query
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    #[must_use]
    pub fn state(&self) -> &RoutingState {
        &self.state
    }

    #[must_use]
    pub fn cursor(&self) -> &PathCursor {
        &self.state.cursor
    }

    #[must_use]
    pub fn captures(&self) -> &ParamVec {
        &self.state.captures
    }

    /// Read a header and record that routing depended on it.
    pub fn inspect_header(&mut self, name: &str, expected: Option<&str>) -> Option<&str> {
        let key = name.to_ascii_lowercase();
        let value = self.headers.get(&key).map(String::as_str);
        self.state
            .header_log
            .insert(key, expected.map(str::to_string));
        value
    }

    /// Read a query value and record that routing depended on it.
    pub fn inspect_query(&mut self, key: &str) -> Option<Option<&str>> {
        self.state.query_log.insert(key.to_string());
        self.query.get(key).map(|v| v.as_deref())
    }

    pub fn next_segment(&mut self) -> Option<&str> {
        self.state.cursor.advance()
    }

    pub fn bind_capture(&mut self, name: Arc<str>, value: String) {
        self.state.captures.push((name, value));
    }

    /// Snapshot the routing state before trying an alternative.
    #[must_use]
    pub fn fork(&self) -> RoutingState {
        self.state.clone()
    }

    /// Replace the live routing state with a snapshot taken by [`fork`](Self::fork).
    pub fn restore(&mut self, snapshot: RoutingState) {
        self.state = snapshot;
    }
}

fn decode_component(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

/// Split a path on `/`, dropping empty segments and percent-decoding the rest.
#[must_use]
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(decode_component)
        .collect()
}

/// Parse a query string; a key without `=` maps to `None`. Later duplicates win.
#[must_use]
pub fn parse_query(query: &str) -> HashMap<String, Option<String>> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let form = |s: &str| decode_component(&s.replace('+', " "));
            match pair.split_once('=') {
                Some((key, value)) => (form(key), Some(form(value))),
                None => (form(pair), None),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path() {
        assert!(split_path("/").is_empty());
        assert_eq!(split_path("/a//b/"), vec!["a", "b"]);
        assert_eq!(split_path("/users/J%C3%BCrgen"), vec!["users", "Jürgen"]);
        assert_eq!(split_path("/bad/%zz"), vec!["bad", "%zz"]);
    }

    #[test]
    fn test_parse_query() {
        let q = parse_query("a=1&flag&b=x+y&a=2&c=%2F&");
        assert_eq!(q.get("a"), Some(&Some("2".to_string())));
        assert_eq!(q.get("flag"), Some(&None));
        assert_eq!(q.get("b"), Some(&Some("x y".to_string())));
        assert_eq!(q.get("c"), Some(&Some("/".to_string())));
        assert_eq!(q.len(), 4);
    }

    #[test]
    fn test_cursor_zipper_invariant() {
        let mut cursor = PathCursor::from_path("/a/b/c");
        let original = cursor.original().to_vec();
        while !cursor.is_exhausted() {
            let joined: Vec<String> = cursor
                .consumed()
                .iter()
                .chain(cursor.remaining())
                .cloned()
                .collect();
            assert_eq!(joined, original);
            cursor.advance();
        }
        assert_eq!(cursor.consumed(), original.as_slice());
        assert!(cursor.advance().is_none());
        assert!(cursor.peek().is_none());
    }

    #[test]
    fn test_context_parses_target() {
        let ctx = RequestContext::new("GET", "/pets/7?limit=3&verbose");
        assert_eq!(ctx.method(), Some(&Method::GET));
        assert_eq!(ctx.path(), "/pets/7");
        assert_eq!(ctx.cursor().remaining(), ["pets", "7"]);
        assert_eq!(ctx.query_value("limit"), Some(Some("3")));
        assert_eq!(ctx.query_value("verbose"), Some(None));
        assert_eq!(ctx.query_value("missing"), None);
    }

    #[test]
    fn test_unparseable_method_is_unknown() {
        let ctx = RequestContext::new("GE T", "/");
        assert!(ctx.method().is_none());
        assert_eq!(ctx.raw_method(), "GE T");
    }

    #[test]
    fn test_headers_are_case_insensitive_and_joined() {
        let ctx = RequestContext::new("GET", "/")
            .with_header("Accept", "text/plain")
            .with_header("ACCEPT", "application/json");
        assert_eq!(ctx.header("accept"), Some("text/plain, application/json"));
    }

    #[test]
    fn test_inspection_is_logged() {
        let mut ctx = RequestContext::new("GET", "/?q=1").with_header("Upgrade", "websocket");
        assert_eq!(ctx.inspect_header("upgrade", Some("websocket")), Some("websocket"));
        assert_eq!(ctx.inspect_header("x-missing", None), None);
        assert_eq!(ctx.inspect_query("q"), Some(Some("1")));
        let log = ctx.state().header_log();
        assert_eq!(log.get("upgrade"), Some(&Some("websocket".to_string())));
        assert_eq!(log.get("x-missing"), Some(&None));
        assert!(ctx.state().query_log().contains("q"));
    }

    #[test]
    fn test_fork_and_restore_roll_back_everything() {
        let mut ctx = RequestContext::new("GET", "/a/b").with_header("x", "1");
        let snapshot = ctx.fork();

        assert_eq!(ctx.next_segment(), Some("a"));
        ctx.bind_capture(Arc::from("id"), "a".to_string());
        ctx.inspect_header("x", None);
        ctx.inspect_query("page");
        assert_ne!(ctx.state(), &snapshot);

        ctx.restore(snapshot.clone());
        assert_eq!(ctx.state(), &snapshot);
        assert_eq!(ctx.cursor().remaining(), ["a", "b"]);
        assert!(ctx.captures().is_empty());
        assert!(ctx.state().header_log().is_empty());
    }

    #[test]
    fn test_body_is_rereadable() {
        let ctx = RequestContext::new("POST", "/").with_body("payload");
        assert_eq!(ctx.body().as_ref(), b"payload");
        assert_eq!(ctx.body().as_ref(), b"payload");
    }
}
