use super::core::Outcome;
use super::error::{AllowedMethods, RoutingError};
use crate::context::RequestContext;
use crate::server::response::Response;
use crate::spec::{Endpoint, MethodSpec};
use http::Method;
use tracing::debug;

/// `Allow` for an endpoint: declared methods in order, then `HEAD` when `GET`
/// is declared, then `OPTIONS`, without duplicates. Empty when nothing is
/// declared.
pub(crate) fn allowed_methods(endpoint: &Endpoint) -> Vec<Method> {
    if endpoint.methods.is_empty() {
        return Vec::new();
    }
    let mut allowed: Vec<Method> = Vec::with_capacity(endpoint.methods.len() + 2);
    for spec in &endpoint.methods {
        if !allowed.contains(&spec.method) {
            allowed.push(spec.method.clone());
        }
    }
    if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
        allowed.push(Method::HEAD);
    }
    if !allowed.contains(&Method::OPTIONS) {
        allowed.push(Method::OPTIONS);
    }
    allowed
}

/// Pick what runs at an endpoint for the request method; `run` executes a
/// declared method.
pub(crate) fn dispatch<F>(
    endpoint: &Endpoint,
    ctx: &mut RequestContext,
    mut run: F,
) -> Result<Outcome, RoutingError>
where
    F: FnMut(&MethodSpec, &mut RequestContext) -> Result<Outcome, RoutingError>,
{
    let allowed = allowed_methods(endpoint);
    let not_allowed = || RoutingError::MethodNotAllowed(AllowedMethods::new(allowed.iter().cloned()));

    if endpoint.methods.is_empty() {
        return Err(RoutingError::MethodNotAllowed(AllowedMethods::default()));
    }
    let Some(method) = ctx.method().cloned() else {
        debug!(method = %ctx.raw_method(), "Unrecognised request method");
        return Err(not_allowed());
    };

    if let Some(spec) = endpoint.method(&method) {
        return run(spec, ctx);
    }

    if method == Method::HEAD {
        if let Some(get) = endpoint.method(&Method::GET) {
            debug!("Serving HEAD through GET");
            return match run(get, ctx)? {
                Outcome::Response(response) => Ok(Outcome::Response(response.into_head())),
                upgrade @ Outcome::Upgrade(_) => Ok(upgrade),
            };
        }
    }

    if method == Method::OPTIONS {
        let allow = allowed
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",");
        return Ok(Outcome::Response(
            Response::empty(endpoint.default_status).add_quiet_header("allow", allow),
        ));
    }

    Err(not_allowed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::MethodSpec;

    fn endpoint(methods: &[Method]) -> Endpoint {
        methods.iter().fold(Endpoint::new(), |e, m| {
            e.with_method(MethodSpec::new(m.clone(), |req| Ok(req.respond().into())))
        })
    }

    #[test]
    fn test_allowed_methods_order() {
        let allowed = allowed_methods(&endpoint(&[Method::POST, Method::GET]));
        assert_eq!(allowed, [Method::POST, Method::GET, Method::HEAD, Method::OPTIONS]);

        let allowed = allowed_methods(&endpoint(&[Method::PUT]));
        assert_eq!(allowed, [Method::PUT, Method::OPTIONS]);

        let allowed = allowed_methods(&endpoint(&[Method::OPTIONS, Method::GET]));
        assert_eq!(allowed, [Method::OPTIONS, Method::GET, Method::HEAD]);

        assert!(allowed_methods(&endpoint(&[])).is_empty());
    }

    #[test]
    fn test_empty_endpoint_allows_nothing() {
        let mut ctx = RequestContext::new("OPTIONS", "/");
        let result = dispatch(&endpoint(&[]), &mut ctx, |_, _| unreachable!());
        assert_eq!(
            result.unwrap_err(),
            RoutingError::MethodNotAllowed(AllowedMethods::default())
        );
    }

    #[test]
    fn test_options_lists_methods() {
        let mut ctx = RequestContext::new("OPTIONS", "/");
        let ep = endpoint(&[Method::GET]).with_default_status(204);
        match dispatch(&ep, &mut ctx, |_, _| unreachable!()).unwrap() {
            Outcome::Response(r) => {
                assert_eq!(r.status(), 204);
                assert_eq!(
                    r.quiet_headers(),
                    [("allow".to_string(), "GET,HEAD,OPTIONS".to_string())]
                );
                assert!(!r.has_body());
            }
            Outcome::Upgrade(_) => panic!("expected a response"),
        }
    }

    #[test]
    fn test_head_runs_get_and_marks_payload_omitted() {
        let mut ctx = RequestContext::new("HEAD", "/");
        let mut ran = None;
        let outcome = dispatch(&endpoint(&[Method::GET]), &mut ctx, |spec, _| {
            ran = Some(spec.method.clone());
            Ok(Outcome::Response(
                Response::ok().add_body(serde_json::json!("hi"), vec!["text/plain".into()]),
            ))
        })
        .unwrap();
        assert_eq!(ran, Some(Method::GET));
        match outcome {
            Outcome::Response(r) => {
                assert!(r.omits_payload());
                assert!(r.has_body());
            }
            Outcome::Upgrade(_) => panic!("expected a response"),
        }
    }

    #[test]
    fn test_head_without_get_is_not_allowed() {
        let mut ctx = RequestContext::new("HEAD", "/");
        let err = dispatch(&endpoint(&[Method::POST]), &mut ctx, |_, _| unreachable!()).unwrap_err();
        assert_eq!(
            err,
            RoutingError::MethodNotAllowed(AllowedMethods::new([Method::POST, Method::OPTIONS]))
        );
    }

    #[test]
    fn test_unknown_method_is_not_allowed() {
        let mut ctx = RequestContext::new("BR EW", "/");
        let err = dispatch(&endpoint(&[Method::GET]), &mut ctx, |_, _| unreachable!()).unwrap_err();
        assert_eq!(err.status(), 405);
    }
}
