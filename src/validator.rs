//! Construction-time checks on a route tree.
//!
//! Every problem found is collected as a [`ValidationIssue`]; the router
//! refuses to build while any remain, so a bad tree never serves traffic.

use crate::codec::CodecRegistry;
use crate::negotiation::MediaType;
use crate::spec::{Endpoint, MethodSpec, ParamSpec, RouteNode, SegmentMatcher};
use http::header::HeaderName;
use http::Method;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path of the offending node, e.g. `/pets/{id} GET`.
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// A route tree failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for RouteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route tree validation failed, {} issue(s) found", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RouteValidationError {}

/// Check a whole tree.
#[must_use]
pub fn validate_tree(root: &RouteNode, codecs: &CodecRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    walk(root, String::new(), codecs, &mut issues);
    issues
}

fn location_or_root(prefix: &str) -> &str {
    if prefix.is_empty() {
        "/"
    } else {
        prefix
    }
}

fn walk(node: &RouteNode, prefix: String, codecs: &CodecRegistry, issues: &mut Vec<ValidationIssue>) {
    match node {
        RouteNode::Segment { matcher, child } => {
            let shown = match matcher {
                SegmentMatcher::Literal(text) => {
                    if text.is_empty() || text.contains('/') {
                        issues.push(ValidationIssue::new(
                            location_or_root(&prefix),
                            "InvalidSegment",
                            format!("literal segment `{text}` must be non-empty and contain no `/`"),
                        ));
                    }
                    text.clone()
                }
                SegmentMatcher::Capture(name) => {
                    if name.is_empty() {
                        issues.push(ValidationIssue::new(
                            location_or_root(&prefix),
                            "InvalidSegment",
                            "capture name must be non-empty",
                        ));
                    }
                    format!("{{{name}}}")
                }
            };
            walk(child, format!("{prefix}/{shown}"), codecs, issues);
        }
        RouteNode::Header { name, child, .. } => {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                issues.push(ValidationIssue::new(
                    location_or_root(&prefix),
                    "InvalidHeaderName",
                    format!("guard header `{name}` is not a valid header name"),
                ));
            }
            walk(child, format!("{prefix}[{name}]"), codecs, issues);
        }
        RouteNode::Alternatives(children) => {
            for child in children {
                walk(child, prefix.clone(), codecs, issues);
            }
        }
        RouteNode::Endpoint(endpoint) => {
            validate_endpoint(endpoint, location_or_root(&prefix), codecs, issues);
        }
    }
}

fn validate_endpoint(
    endpoint: &Endpoint,
    location: &str,
    codecs: &CodecRegistry,
    issues: &mut Vec<ValidationIssue>,
) {
    if !(100..=599).contains(&endpoint.default_status) {
        issues.push(ValidationIssue::new(
            location,
            "InvalidStatus",
            format!("default status {} is outside 100-599", endpoint.default_status),
        ));
    }

    let mut seen = HashSet::new();
    for spec in &endpoint.methods {
        let here = format!("{location} {}", spec.method);
        if spec.method == Method::HEAD {
            issues.push(ValidationIssue::new(
                &here,
                "DeclaredHead",
                "HEAD is derived from GET and cannot be declared",
            ));
        }
        if !seen.insert(spec.method.clone()) {
            issues.push(ValidationIssue::new(
                &here,
                "DuplicateMethod",
                format!("{} is declared more than once", spec.method),
            ));
        }
        validate_method(spec, &here, codecs, issues);
    }
}

fn validate_params(params: &[ParamSpec], what: &str, location: &str, issues: &mut Vec<ValidationIssue>) {
    let mut names = HashSet::new();
    for param in params {
        if param.name.is_empty() {
            issues.push(ValidationIssue::new(
                location,
                "InvalidParameter",
                format!("{what} parameter name must be non-empty"),
            ));
        } else if !names.insert(param.name.as_str()) {
            issues.push(ValidationIssue::new(
                location,
                "DuplicateParameter",
                format!("{what} parameter `{}` is declared more than once", param.name),
            ));
        }
    }
}

fn validate_method(
    spec: &MethodSpec,
    location: &str,
    codecs: &CodecRegistry,
    issues: &mut Vec<ValidationIssue>,
) {
    validate_params(&spec.headers, "header", location, issues);
    validate_params(&spec.query, "query", location, issues);
    for header in &spec.headers {
        if !header.name.is_empty() && HeaderName::from_bytes(header.name.as_bytes()).is_err() {
            issues.push(ValidationIssue::new(
                location,
                "InvalidHeaderName",
                format!("`{}` is not a valid header name", header.name),
            ));
        }
    }

    for declared in &spec.consumes {
        match MediaType::parse(declared) {
            Err(e) => issues.push(ValidationIssue::new(location, "InvalidMediaType", e.to_string())),
            Ok(mt) if !mt.is_wildcard() && codecs.find(declared).is_none() => {
                issues.push(ValidationIssue::new(
                    location,
                    "MissingCodec",
                    format!("no codec registered to decode `{declared}`"),
                ));
            }
            Ok(_) => {}
        }
    }
    if spec.body_required && spec.consumes.is_empty() {
        issues.push(ValidationIssue::new(
            location,
            "InvalidBody",
            "a required body needs at least one accepted content type",
        ));
    }

    for declared in &spec.produces {
        match MediaType::parse(declared) {
            Err(e) => issues.push(ValidationIssue::new(location, "InvalidMediaType", e.to_string())),
            Ok(mt) if mt.is_wildcard() => issues.push(ValidationIssue::new(
                location,
                "InvalidMediaType",
                format!("produced type `{declared}` must be concrete"),
            )),
            Ok(_) if codecs.find(declared).is_none() => issues.push(ValidationIssue::new(
                location,
                "MissingCodec",
                format!("no codec registered to encode `{declared}`"),
            )),
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ValueKind;
    use crate::spec::{alternatives, capture, header_guard, literal, path, Endpoint, MethodSpec};

    fn ok_method(method: Method) -> MethodSpec {
        MethodSpec::new(method, |req| Ok(req.respond().into()))
    }

    fn kinds(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.kind.as_str()).collect()
    }

    #[test]
    fn test_valid_tree_has_no_issues() {
        let tree = alternatives(vec![
            path("/pets/{id}", Endpoint::new().with_method(ok_method(Method::GET)).into_node()),
            header_guard(
                "upgrade",
                Some("websocket"),
                Endpoint::new().with_method(ok_method(Method::GET)).into_node(),
            ),
        ]);
        assert!(validate_tree(&tree, &CodecRegistry::default()).is_empty());
    }

    #[test]
    fn test_head_and_duplicates_are_rejected() {
        let endpoint = Endpoint::new()
            .with_method(ok_method(Method::HEAD))
            .with_method(ok_method(Method::GET))
            .with_method(ok_method(Method::GET))
            .into_node();
        let issues = validate_tree(&path("/a", endpoint), &CodecRegistry::default());
        assert_eq!(kinds(&issues), ["DeclaredHead", "DuplicateMethod"]);
        assert_eq!(issues[0].location, "/a HEAD");
    }

    #[test]
    fn test_bad_segments_and_status() {
        let tree = literal(
            "a/b",
            capture("", Endpoint::new().with_default_status(42).into_node()),
        );
        let issues = validate_tree(&tree, &CodecRegistry::default());
        assert_eq!(kinds(&issues), ["InvalidSegment", "InvalidSegment", "InvalidStatus"]);
    }

    #[test]
    fn test_media_types_need_codecs() {
        let spec = ok_method(Method::POST)
            .consumes(&["application/json", "text/*", "image/png", "bogus"])
            .produces(&["application/*", "application/msgpack"]);
        let issues = validate_tree(
            &Endpoint::new().with_method(spec).into_node(),
            &CodecRegistry::default(),
        );
        assert_eq!(
            kinds(&issues),
            ["MissingCodec", "InvalidMediaType", "InvalidMediaType", "MissingCodec"]
        );
    }

    #[test]
    fn test_parameter_checks() {
        let spec = ok_method(Method::GET)
            .header(ParamSpec::required("x-a", ValueKind::Text))
            .header(ParamSpec::optional("X-A", ValueKind::Integer))
            .header(ParamSpec::optional("bad header", ValueKind::Text))
            .body_required(true);
        let issues = validate_tree(
            &Endpoint::new().with_method(spec).into_node(),
            &CodecRegistry::default(),
        );
        assert_eq!(
            kinds(&issues),
            ["DuplicateParameter", "InvalidHeaderName", "InvalidBody"]
        );
    }

    #[test]
    fn test_error_display_lists_issues() {
        let err = RouteValidationError {
            issues: vec![ValidationIssue::new("/", "DeclaredHead", "nope")],
        };
        let text = err.to_string();
        assert!(text.contains("1 issue(s)"));
        assert!(text.contains("[DeclaredHead] /: nope"));
    }
}
