//! Double-submit CSRF protection.
//!
//! [`ensure_csrf_cookie`] makes sure every request has a token: it reuses the
//! `csrftoken` cookie or mints a new one (and sets the cookie on the
//! response). Handlers take [`CsrfToken`] as an extractor, put it into forms
//! as `csrfmiddlewaretoken` and check it on submission.

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderValue},
    middleware::{from_fn, Next},
    response::Response,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::page::PageError;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

const TOKEN_BYTES: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    pub fn generate() -> Self {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    fn parse(raw: &str) -> Option<Self> {
        let well_formed =
            raw.len() == TOKEN_BYTES * 2 && raw.bytes().all(|b| b.is_ascii_hexdigit());
        well_formed.then(|| Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a submitted form value.
    pub fn matches(&self, submitted: &str) -> bool {
        let (a, b) = (self.0.as_bytes(), submitted.as_bytes());
        a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }

    pub fn verify(&self, submitted: Option<&str>) -> Result<(), PageError> {
        match submitted {
            Some(value) if self.matches(value) => Ok(()),
            Some(_) => Err(PageError::forbidden(
                "CSRF verification failed. CSRF token incorrect.",
            )),
            None => Err(PageError::forbidden(
                "CSRF verification failed. CSRF token missing.",
            )),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CsrfToken {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CsrfToken>()
            .cloned()
            .ok_or_else(|| PageError::Internal(anyhow::anyhow!("CSRF middleware is not installed")))
    }
}

pub async fn ensure_csrf_cookie(mut req: Request, next: Next) -> Response {
    let existing = CookieJar::from_headers(req.headers())
        .get(CSRF_COOKIE)
        .and_then(|c| CsrfToken::parse(c.value()));
    let (token, fresh) = match existing {
        Some(token) => (token, false),
        None => (CsrfToken::generate(), true),
    };
    req.extensions_mut().insert(token.clone());

    let mut resp = next.run(req).await;
    if fresh {
        let cookie = Cookie::build((CSRF_COOKIE, token.0))
            .path("/")
            .same_site(SameSite::Lax)
            .build();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(v) => {
                resp.headers_mut().append(header::SET_COOKIE, v);
            }
            Err(e) => tracing::warn!(error = %e, "cannot encode CSRF cookie"),
        }
    }
    resp
}

/// Install [`ensure_csrf_cookie`] on every route currently in `router`.
pub fn with_csrf(router: Router) -> Router {
    router.layer(from_fn(ensure_csrf_cookie))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get};
    use tower::ServiceExt;

    async fn echo(token: CsrfToken) -> String {
        token.as_str().to_string()
    }

    fn app() -> Router {
        with_csrf(Router::new().route("/", get(echo)))
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn new_visitor_gets_cookie() {
        let resp = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        let token = body_text(resp).await;
        assert_eq!(token.len(), 64);
        assert!(set_cookie.starts_with(&format!("csrftoken={token}")));
        assert!(set_cookie.contains("Path=/"));
    }

    #[tokio::test]
    async fn existing_cookie_is_reused() {
        let token = CsrfToken::generate();
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, format!("csrftoken={}", token.as_str()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_text(resp).await, token.as_str());
    }

    #[tokio::test]
    async fn malformed_cookie_is_replaced() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::COOKIE, "csrftoken=short")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.headers().get(header::SET_COOKIE).is_some());
    }

    #[test]
    fn verify_matches_exact_token_only() {
        let token = CsrfToken::generate();
        assert!(token.verify(Some(token.as_str())).is_ok());
        assert!(matches!(
            token.verify(Some("nope")),
            Err(PageError::Forbidden(_))
        ));
        assert!(matches!(token.verify(None), Err(PageError::Forbidden(_))));
    }
}
