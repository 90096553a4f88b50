//! Path-pattern routing.
//!
//! Routes are declared as patterns with literal and `{param}` segments
//! and matched in registration order; the first route whose path and
//! method both match wins. A path that matches some route but with the
//! wrong method yields [`RouteOutcome::MethodNotAllowed`], so the error
//! stage can answer 405 instead of 404.

use crate::resources::Operation;
use http::Method;
use std::collections::HashMap;

/// One segment of a route pattern.
#[derive(Debug, Clone)]
enum PathSegment {
    /// Matches the exact text.
    Literal(String),
    /// Matches any non-empty segment and captures it under the name.
    Param(String),
}

/// A single registered route.
#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    operation: Operation,
}

impl Route {
    fn new(method: Method, pattern: &str, operation: Operation) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map_or_else(
                        || PathSegment::Literal(segment.to_string()),
                        |name| PathSegment::Param(name.to_string()),
                    )
            })
            .collect();

        Self {
            method,
            segments,
            operation,
        }
    }

    /// Matches the path against this route's segments, capturing params.
    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, actual) in self.segments.iter().zip(&segments) {
            match pattern {
                PathSegment::Literal(expected) => {
                    if expected != actual {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    params.insert(name.clone(), (*actual).to_string());
                }
            }
        }

        Some(params)
    }
}

/// Result of routing a request.
#[derive(Debug)]
pub enum RouteOutcome {
    /// A route matched; dispatch the operation with the captured params.
    Matched {
        /// The operation to dispatch.
        operation: Operation,
        /// Captured path parameters, keyed by pattern name.
        params: HashMap<String, String>,
    },
    /// The path exists but no route supports the request method.
    MethodNotAllowed,
    /// No route matches the path at all.
    NotFound,
}

/// Registration-ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a route pattern for a method and operation.
    #[must_use]
    pub fn route(mut self, method: Method, pattern: &str, operation: Operation) -> Self {
        self.routes.push(Route::new(method, pattern, operation));
        self
    }

    /// Routes a request, distinguishing unknown paths from known paths
    /// hit with an unsupported method.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteOutcome {
        let mut path_matched = false;

        for route in &self.routes {
            if let Some(params) = route.match_path(path) {
                if route.method == *method {
                    return RouteOutcome::Matched {
                        operation: route.operation,
                        params,
                    };
                }
                path_matched = true;
            }
        }

        if path_matched {
            RouteOutcome::MethodNotAllowed
        } else {
            RouteOutcome::NotFound
        }
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Checks whether any routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new()
            .route(Method::GET, "/videos", Operation::ListVideos)
            .route(Method::POST, "/videos", Operation::CreateVideo)
            .route(Method::GET, "/videos/{id}", Operation::GetVideo)
            .route(Method::DELETE, "/videos/{id}", Operation::DeleteVideo)
            .route(
                Method::GET,
                "/videos/{id}/comments",
                Operation::ListVideoComments,
            )
    }

    #[test]
    fn test_literal_match() {
        let outcome = router().lookup(&Method::GET, "/videos");
        assert!(matches!(
            outcome,
            RouteOutcome::Matched {
                operation: Operation::ListVideos,
                ..
            }
        ));
    }

    #[test]
    fn test_param_capture() {
        match router().lookup(&Method::GET, "/videos/42") {
            RouteOutcome::Matched { operation, params } => {
                assert_eq!(operation, Operation::GetVideo);
                assert_eq!(params.get("id").map(String::as_str), Some("42"));
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_path() {
        match router().lookup(&Method::GET, "/videos/7/comments") {
            RouteOutcome::Matched { operation, params } => {
                assert_eq!(operation, Operation::ListVideoComments);
                assert_eq!(params.get("id").map(String::as_str), Some("7"));
            }
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_slash_is_equivalent() {
        assert!(matches!(
            router().lookup(&Method::GET, "/videos/"),
            RouteOutcome::Matched { .. }
        ));
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        assert!(matches!(
            router().lookup(&Method::GET, "/playlists"),
            RouteOutcome::NotFound
        ));
        assert!(matches!(
            router().lookup(&Method::GET, "/videos/1/comments/2"),
            RouteOutcome::NotFound
        ));
    }

    #[test]
    fn test_known_path_wrong_method_is_405() {
        assert!(matches!(
            router().lookup(&Method::PATCH, "/videos"),
            RouteOutcome::MethodNotAllowed
        ));
        assert!(matches!(
            router().lookup(&Method::PUT, "/videos/3"),
            RouteOutcome::MethodNotAllowed
        ));
    }

    #[test]
    fn test_first_registration_wins() {
        let router = Router::new()
            .route(Method::GET, "/videos/featured", Operation::ListVideos)
            .route(Method::GET, "/videos/{id}", Operation::GetVideo);

        assert!(matches!(
            router.lookup(&Method::GET, "/videos/featured"),
            RouteOutcome::Matched {
                operation: Operation::ListVideos,
                ..
            }
        ));
    }
}
