use crate::runtime_config::BacktrackPolicy;
use crate::server::response::Response;
use http::Method;
use std::fmt;

/// Methods reported in a `405` response, kept sorted by name and free of
/// duplicates so that `Allow` is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedMethods(Vec<Method>);

impl AllowedMethods {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut methods: Vec<Method> = methods.into_iter().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods.dedup();
        Self(methods)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }

    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.0.contains(method)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn union(&self, other: &AllowedMethods) -> AllowedMethods {
        AllowedMethods::new(self.0.iter().chain(other.0.iter()).cloned())
    }

    /// Value for the `Allow` header, e.g. `GET,HEAD,OPTIONS`.
    #[must_use]
    pub fn header_value(&self) -> String {
        self.0
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Why a request could not be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No route matched; siblings may still be tried.
    NotFound,
    /// The request matched a route but a header, query value or body was
    /// missing or could not be decoded.
    BadRequest(Option<String>),
    /// The request `Content-Type` matches none of the accepted types.
    UnsupportedMediaType,
    /// The path matched but the method did not.
    MethodNotAllowed(AllowedMethods),
}

impl RoutingError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        RoutingError::BadRequest(Some(message.into()))
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            RoutingError::NotFound => 404,
            RoutingError::BadRequest(_) => 400,
            RoutingError::UnsupportedMediaType => 415,
            RoutingError::MethodNotAllowed(_) => 405,
        }
    }

    /// Whether a sibling alternative may run after this error.
    #[must_use]
    pub fn is_ignorable(&self, policy: BacktrackPolicy) -> bool {
        match self {
            RoutingError::NotFound => true,
            RoutingError::MethodNotAllowed(_) => policy == BacktrackPolicy::MergeMethods,
            _ => false,
        }
    }

    /// Combine two ignorable errors from sibling branches: verb sets are
    /// unioned and a `405` outranks a `404`.
    #[must_use]
    pub fn merge_ignored(self, other: RoutingError) -> RoutingError {
        match (self, other) {
            (RoutingError::MethodNotAllowed(a), RoutingError::MethodNotAllowed(b)) => {
                RoutingError::MethodNotAllowed(a.union(&b))
            }
            (mna @ RoutingError::MethodNotAllowed(_), _) => mna,
            (_, mna @ RoutingError::MethodNotAllowed(_)) => mna,
            (first, _) => first,
        }
    }

    /// The bodiless (or plain-text) response that reports this error.
    #[must_use]
    pub fn to_response(&self) -> Response {
        let response = Response::empty(self.status());
        match self {
            RoutingError::BadRequest(Some(message)) => response.add_body(
                serde_json::Value::String(message.clone()),
                vec!["text/plain".to_string()],
            ),
            RoutingError::MethodNotAllowed(allowed) => {
                response.add_quiet_header("allow", allowed.header_value())
            }
            _ => response,
        }
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::NotFound => write!(f, "no route matches the request"),
            RoutingError::BadRequest(Some(message)) => write!(f, "bad request: {message}"),
            RoutingError::BadRequest(None) => write!(f, "bad request"),
            RoutingError::UnsupportedMediaType => write!(f, "unsupported request media type"),
            RoutingError::MethodNotAllowed(allowed) => {
                write!(f, "method not allowed (allowed: {})", allowed.header_value())
            }
        }
    }
}

impl std::error::Error for RoutingError {}
