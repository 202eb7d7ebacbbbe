//! Named routes and reverse resolution.
//!
//! Every page route is registered under a stable name so that handlers and
//! templates build links with `reverse("book_detail", &[id])` instead of
//! hard-coding paths. Patterns use the axum syntax (`/books/{id}/`).

use axum::{routing::MethodRouter, Router};
use parking_lot::RwLock;
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("no route named '{0}'")]
    NoSuchRoute(String),

    #[error("route name '{0}' is already registered")]
    DuplicateName(String),

    #[error("route '{name}' expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid argument '{arg}' for route '{name}'")]
    InvalidArgument { name: String, arg: String },
}

#[derive(Default)]
pub struct UrlRegistry {
    routes: RwLock<HashMap<String, String>>,
}

impl UrlRegistry {
    pub fn register(&self, name: &str, pattern: &str) -> Result<(), UrlError> {
        let mut routes = self.routes.write();
        if routes.contains_key(name) {
            return Err(UrlError::DuplicateName(name.to_string()));
        }
        routes.insert(name.to_string(), pattern.to_string());
        Ok(())
    }

    pub fn pattern(&self, name: &str) -> Option<String> {
        self.routes.read().get(name).cloned()
    }

    /// Fill the `{param}` segments of the named pattern, in order.
    pub fn reverse(&self, name: &str, args: &[&str]) -> Result<String, UrlError> {
        let pattern = self
            .pattern(name)
            .ok_or_else(|| UrlError::NoSuchRoute(name.to_string()))?;

        let expected = pattern.matches('{').count();
        if expected != args.len() {
            return Err(UrlError::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            });
        }

        let mut out = String::with_capacity(pattern.len() + 36 * args.len());
        let mut rest = pattern.as_str();
        for arg in args {
            if matches!(*arg, "" | "." | "..")
                || arg.contains(|c: char| matches!(c, '/' | '?' | '#'))
            {
                return Err(UrlError::InvalidArgument {
                    name: name.to_string(),
                    arg: (*arg).to_string(),
                });
            }
            // Counted above, so both braces are present.
            let (Some(open), Some(close)) = (rest.find('{'), rest.find('}')) else {
                break;
            };
            let segment = encode_segment(arg).ok_or_else(|| UrlError::InvalidArgument {
                name: name.to_string(),
                arg: (*arg).to_string(),
            })?;
            out.push_str(&rest[..open]);
            out.push_str(&segment);
            rest = &rest[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Percent-encode one path segment. The result never carries HTML
/// metacharacters, so reversed paths are safe inside attribute values.
fn encode_segment(arg: &str) -> Option<String> {
    let mut url = Url::parse("http://localhost/").ok()?;
    url.path_segments_mut().ok()?.clear().push(arg);
    let encoded = url.path().strip_prefix('/').filter(|s| !s.is_empty())?;
    Some(encoded.replace('\'', "%27").replace('&', "%26"))
}

/// Register a route on a router and under a name in one step.
pub trait NamedRoutes: Sized {
    fn named_route(
        self,
        urls: &UrlRegistry,
        name: &str,
        pattern: &str,
        method_router: MethodRouter,
    ) -> Result<Self, UrlError>;
}

impl NamedRoutes for Router {
    fn named_route(
        self,
        urls: &UrlRegistry,
        name: &str,
        pattern: &str,
        method_router: MethodRouter,
    ) -> Result<Self, UrlError> {
        urls.register(name, pattern)?;
        Ok(self.route(pattern, method_router))
    }
}
