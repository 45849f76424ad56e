mod common;

use common::temp_files::{create_temp_json, create_temp_yaml};
use common::{header, send};
use serde_json::json;
use verbtree::prelude::*;
use verbtree::spec::load_routes;

const PETS_YAML: &str = r#"
routes:
  - path: /pets
    methods:
      - method: GET
        handler: list_pets
        query:
          - { name: tags, type: array, items: integer }
        produces: [application/json]
      - method: POST
        handler: create_pet
        consumes: [application/json]
        body_required: true
  - path: /pets/{id}
    guards:
      - header: x-api-version
        equals: "2"
    methods:
      - method: GET
        handler: get_pet_v2
  - path: /pets/{id}
    methods:
      - method: GET
        handler: get_pet
        headers:
          - { name: x-tenant, required: true }
"#;

fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register_fn("list_pets", |req| {
        let tags = req.get_query_param("tags").cloned().unwrap_or(json!([]));
        Ok(req
            .respond()
            .add_body(json!({"tags": tags}), vec![])
            .into())
    });
    registry.register_fn("create_pet", |req| {
        Ok(req
            .respond()
            .add_body(req.body.clone().unwrap_or_default(), vec!["application/json".into()])
            .into())
    });
    registry.register_fn("get_pet", |req| {
        let tenant = req.get_header("x-tenant").cloned();
        Ok(req
            .respond()
            .add_body(
                json!({"id": req.get_path_param("id"), "tenant": tenant}),
                vec!["application/json".into()],
            )
            .into())
    });
    registry.register_fn("get_pet_v2", |req| {
        Ok(req
            .respond()
            .add_body(json!({"id": req.get_path_param("id"), "v": 2}), vec!["application/json".into()])
            .into())
    });
    registry
}

fn service_from(file: &tempfile::NamedTempFile) -> AppService {
    let root = load_routes(file.path(), &registry()).unwrap();
    AppService::new(Router::new(root).unwrap())
}

#[test]
fn test_yaml_document_routes_requests() {
    let file = create_temp_yaml(PETS_YAML);
    let service = service_from(&file);

    let resp = send(&service, "GET", "/pets?tags=1,2", &[], "");
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "content-type"), Some("application/json"));
    assert_eq!(resp.body(), br#"{"tags":[1,2]}"#);

    let resp = send(
        &service,
        "POST",
        "/pets",
        &[("content-type", "application/json")],
        r#"{"name":"Rex"}"#,
    );
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body(), br#"{"name":"Rex"}"#);

    let resp = send(&service, "POST", "/pets", &[], "");
    assert_eq!(resp.status(), 400);

    let resp = send(&service, "OPTIONS", "/pets", &[], "");
    assert_eq!(header(&resp, "allow"), Some("GET,POST,HEAD,OPTIONS"));
}

#[test]
fn test_yaml_document_guards_and_headers() {
    let file = create_temp_yaml(PETS_YAML);
    let service = service_from(&file);

    let resp = send(&service, "GET", "/pets/5", &[("x-api-version", "2")], "");
    assert_eq!(resp.body(), br#"{"id":"5","v":2}"#);
    assert_eq!(header(&resp, "vary"), Some("x-api-version"));

    let resp = send(&service, "GET", "/pets/5", &[("x-tenant", "acme")], "");
    assert_eq!(resp.body(), br#"{"id":"5","tenant":"acme"}"#);
    assert_eq!(header(&resp, "vary"), Some("x-tenant"));

    let resp = send(&service, "GET", "/pets/5", &[], "");
    assert_eq!(resp.status(), 400);
}

#[test]
fn test_json_document_with_default_status() {
    let file = create_temp_json(
        r#"{
            "routes": [
                {
                    "path": "/jobs",
                    "status": 201,
                    "methods": [{"method": "post", "handler": "create_pet", "consumes": ["application/json"]}]
                }
            ]
        }"#,
    );
    let service = service_from(&file);

    let resp = send(
        &service,
        "POST",
        "/jobs",
        &[("content-type", "application/json")],
        r#"{"job":1}"#,
    );
    assert_eq!(resp.status(), 201);
    assert_eq!(resp.body(), br#"{"job":1}"#);

    let resp = send(&service, "GET", "/jobs", &[], "");
    assert_eq!(resp.status(), 405);
    assert_eq!(header(&resp, "allow"), Some("OPTIONS,POST"));
}

#[test]
fn test_missing_file_is_an_error() {
    let err = load_routes("/definitely/not/here.yaml", &registry()).unwrap_err();
    assert!(err.to_string().contains("failed to read route document"));
}

#[test]
fn test_malformed_documents_are_rejected() {
    let file = create_temp_yaml("routes: [");
    assert!(load_routes(file.path(), &registry()).is_err());

    let file = create_temp_yaml("routes:\n  - path: /pets\n    verbs: []\n");
    let err = load_routes(file.path(), &registry()).unwrap_err();
    assert!(format!("{err:#}").contains("verbs"));

    let file = create_temp_json(r#"{"routes": [{"path": "/a", "methods": [{"method": "GET", "handler": "ghost"}]}]}"#);
    let err = load_routes(file.path(), &registry()).unwrap_err();
    assert!(format!("{err:#}").contains("ghost"));
}

#[test]
fn test_loaded_tree_is_still_validated() {
    let file = create_temp_yaml(
        "routes:\n  - path: /teapot\n    status: 42\n    methods:\n      - { method: GET, handler: get_pet }\n",
    );
    let root = load_routes(file.path(), &registry()).unwrap();
    let err = Router::new(root).unwrap_err();
    assert!(err.issues.iter().any(|issue| issue.kind == "InvalidStatus"));
}
