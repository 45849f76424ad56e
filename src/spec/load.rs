//! Route documents: a YAML or JSON description of the route tree.
//!
//! ```yaml
//! routes:
//!   - path: /pets/{id}
//!     status: 200
//!     guards:
//!       - header: x-api-version
//!         equals: "2"
//!     methods:
//!       - method: GET
//!         handler: get_pet
//!         headers:
//!           - { name: x-tenant, required: true }
//!         query:
//!           - { name: expand, type: array, items: string }
//!         produces: [application/json]
//!       - method: PUT
//!         handler: update_pet
//!         consumes: [application/json]
//!         body_required: true
//! ```
//!
//! Routes become alternatives in document order; handler names are resolved
//! through a [`HandlerRegistry`].

use super::build::{alternatives, header_guard, path};
use super::types::{Endpoint, MethodSpec, ParamSpec, RouteNode};
use crate::codec::ValueKind;
use crate::handler::HandlerRegistry;
use anyhow::{anyhow, bail, Context};
use http::Method;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` is JSON; everything else is read as YAML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDocument {
    pub routes: Vec<RouteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub path: String,
    #[serde(default)]
    pub guards: Vec<GuardEntry>,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct GuardEntry {
    pub header: String,
    #[serde(default)]
    pub equals: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodEntry {
    pub method: String,
    pub handler: String,
    #[serde(default)]
    pub headers: Vec<ParamEntry>,
    #[serde(default)]
    pub query: Vec<ParamEntry>,
    #[serde(default)]
    pub consumes: Vec<String>,
    #[serde(default)]
    pub produces: Option<Vec<String>>,
    #[serde(default)]
    pub body_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamEntry {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    /// Item type for `type: array`.
    #[serde(default)]
    pub items: Option<String>,
}

fn default_kind() -> String {
    "string".to_string()
}

fn value_kind(name: &str, items: Option<&str>) -> anyhow::Result<ValueKind> {
    Ok(match name {
        "string" => ValueKind::Text,
        "integer" => ValueKind::Integer,
        "number" => ValueKind::Number,
        "boolean" => ValueKind::Boolean,
        "json" => ValueKind::Json,
        "array" => {
            let item = value_kind(items.unwrap_or("string"), None)?;
            if matches!(item, ValueKind::List(_)) {
                bail!("nested arrays are not supported");
            }
            ValueKind::List(Box::new(item))
        }
        other => bail!("unknown parameter type `{other}`"),
    })
}

fn param_spec(entry: &ParamEntry) -> anyhow::Result<ParamSpec> {
    let kind = value_kind(&entry.kind, entry.items.as_deref())
        .with_context(|| format!("parameter `{}`", entry.name))?;
    Ok(ParamSpec {
        name: entry.name.clone(),
        required: entry.required,
        kind,
    })
}

fn method_spec(entry: &MethodEntry, registry: &HandlerRegistry) -> anyhow::Result<MethodSpec> {
    let method = Method::from_bytes(entry.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid method `{}`", entry.method))?;
    let handler = registry
        .get(&entry.handler)
        .ok_or_else(|| anyhow!("handler `{}` is not registered", entry.handler))?;

    let mut spec = MethodSpec::with_handler(method, handler)
        .named(&entry.handler)
        .body_required(entry.body_required);
    spec.consumes = entry.consumes.clone();
    if let Some(produces) = &entry.produces {
        spec.produces = produces.clone();
    }
    for header in &entry.headers {
        spec = spec.header(param_spec(header)?);
    }
    for query in &entry.query {
        spec = spec.query(param_spec(query)?);
    }
    Ok(spec)
}

/// The segments a template matches, with every capture reduced to `{}`:
/// `/pets/{id}/` and `/pets/{name}` have the same shape.
fn route_shape(template: &str) -> Vec<String> {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.starts_with('{') && s.ends_with('}') {
                "{}".to_string()
            } else {
                s.to_string()
            }
        })
        .collect()
}

/// Turn a parsed document into a route tree.
pub fn build_from_document(
    document: &RouteDocument,
    registry: &HandlerRegistry,
) -> anyhow::Result<RouteNode> {
    let mut seen = HashSet::new();
    let mut routes = Vec::with_capacity(document.routes.len());

    for route in &document.routes {
        let key = (route_shape(&route.path), route.guards.clone());
        if !seen.insert(key) {
            bail!("duplicate route `{}`", route.path);
        }

        let mut endpoint = Endpoint::new().with_default_status(route.status);
        for entry in &route.methods {
            let spec = method_spec(entry, registry)
                .with_context(|| format!("route `{}` method `{}`", route.path, entry.method))?;
            endpoint = endpoint.with_method(spec);
        }

        let leaf = route.guards.iter().rev().fold(endpoint.into_node(), |child, guard| {
            header_guard(&guard.header, guard.equals.as_deref(), child)
        });
        debug!(path = %route.path, methods = route.methods.len(), "Loaded route");
        routes.push(path(&route.path, leaf));
    }

    Ok(alternatives(routes))
}

/// Parse a route document from a string.
pub fn load_routes_from_str(
    content: &str,
    format: DocumentFormat,
    registry: &HandlerRegistry,
) -> anyhow::Result<RouteNode> {
    let document: RouteDocument = match format {
        DocumentFormat::Yaml => {
            serde_yaml::from_str(content).context("failed to parse YAML route document")?
        }
        DocumentFormat::Json => {
            serde_json::from_str(content).context("failed to parse JSON route document")?
        }
    };
    build_from_document(&document, registry)
}

/// Load a route document from disk; the format follows the file extension.
pub fn load_routes(file_path: impl AsRef<Path>, registry: &HandlerRegistry) -> anyhow::Result<RouteNode> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read route document {}", file_path.display()))?;
    let root = load_routes_from_str(&content, DocumentFormat::from_path(file_path), registry)
        .with_context(|| format!("invalid route document {}", file_path.display()))?;
    info!(path = %file_path.display(), "Route document loaded");
    Ok(root)
}
