#![allow(dead_code)]

use http::Method;
use serde_json::json;
use verbtree::prelude::*;

/// The single-endpoint service: `GET /` answers `Hello` with `Cache-Control: foo`.
pub fn hello_service() -> AppService {
    let tree = path(
        "/",
        Endpoint::new()
            .with_method(MethodSpec::new(Method::GET, |req| {
                Ok(req
                    .respond()
                    .add_header("cache-control", json!("foo"))
                    .add_body(json!("Hello"), vec!["text/plain".into()])
                    .into())
            }))
            .into_node(),
    );
    AppService::new(Router::new(tree).unwrap())
}

pub fn send(
    service: &AppService,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> http::Response<Vec<u8>> {
    let mut builder = http::Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    service.call(builder.body(body.as_bytes().to_vec()).unwrap())
}

pub fn header<'a>(response: &'a http::Response<Vec<u8>>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// A route document on disk; the file is removed when the handle drops.
    pub fn create_temp_document(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("verbtree_routes_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_document(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> NamedTempFile {
        create_temp_document(content, "json")
    }
}
