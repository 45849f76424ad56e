use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;
use verbtree::prelude::*;
use verbtree::spec::{load_routes_from_str, DocumentFormat};

fn example_document() -> &'static str {
    r#"
routes:
  - path: /
    methods:
      - { method: GET, handler: ok }
  - path: /zoo/animals
    methods:
      - { method: GET, handler: ok, produces: [application/json, application/yaml] }
      - { method: POST, handler: ok, consumes: [application/json] }
  - path: /zoo/animals/{id}
    guards:
      - { header: x-api-version, equals: "2" }
    methods:
      - { method: GET, handler: ok }
  - path: /zoo/animals/{id}
    methods:
      - { method: GET, handler: ok }
      - { method: PUT, handler: ok, consumes: [application/json] }
      - { method: PATCH, handler: ok, consumes: [application/json] }
      - { method: DELETE, handler: ok }
  - path: /zoo/animals/{id}/toys/{toy_id}
    methods:
      - { method: GET, handler: ok }
  - path: /zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}
    methods:
      - { method: GET, handler: ok }
  - path: /inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}
    methods:
      - { method: POST, handler: ok }
  - path: /complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}
    methods:
      - method: GET
        handler: ok
        query:
          - { name: limit, type: integer }
"#
}

fn build_router() -> Router {
    let mut registry = HandlerRegistry::new();
    registry.register_fn("ok", |req| {
        let id = req.get_path_param("id").map(str::to_string);
        Ok(req.respond().add_body(json!({ "id": id }), vec![]).into())
    });
    let root = load_routes_from_str(example_document(), DocumentFormat::Yaml, &registry)
        .unwrap_or_else(|e| panic!("failed to load route document: {e:#}"));
    Router::new(root).unwrap_or_else(|e| panic!("invalid route tree: {e}"))
}

const TEST_REQUESTS: [(&str, &str); 7] = [
    ("GET", "/zoo/animals/123"),
    ("GET", "/zoo/animals/123/toys/456"),
    ("GET", "/zoo/cats/animals/123/habitats/88/sections/5"),
    ("POST", "/inventory/1/feeds/2/items/3/batches/4"),
    ("GET", "/complex/1/2/3/4/5/6/7/8/9?limit=5"),
    ("OPTIONS", "/zoo/animals"),
    ("GET", "/zoo/missing"),
];

fn bench_route_throughput(c: &mut Criterion) {
    let router = build_router();
    c.bench_function("route_match", |b| {
        b.iter(|| {
            for (method, target) in &TEST_REQUESTS {
                let mut ctx = RequestContext::new(method, target);
                let res = router.route(&mut ctx);
                black_box(&res);
            }
        })
    });
}

fn bench_service_round_trip(c: &mut Criterion) {
    let service = AppService::new(build_router());
    c.bench_function("service_round_trip", |b| {
        b.iter(|| {
            for (method, target) in &TEST_REQUESTS {
                let req = http::Request::builder()
                    .method(*method)
                    .uri(*target)
                    .header("accept", "application/yaml;q=0.5, application/json")
                    .body(Vec::new())
                    .unwrap_or_default();
                black_box(service.call(req));
            }
        })
    });
}

fn bench_guarded_backtracking(c: &mut Criterion) {
    let router = build_router();
    c.bench_function("guard_backtrack", |b| {
        b.iter(|| {
            let mut ctx = RequestContext::new("GET", "/zoo/animals/7");
            black_box(router.route(&mut ctx).is_ok());
            let mut ctx =
                RequestContext::new("GET", "/zoo/animals/7").with_header("x-api-version", "2");
            black_box(router.route(&mut ctx).is_ok());
        })
    });
}

criterion_group!(
    benches,
    bench_route_throughput,
    bench_service_round_trip,
    bench_guarded_backtracking
);
criterion_main!(benches);
