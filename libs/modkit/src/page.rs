//! Template-backed HTML responses.
//!
//! Handlers return a [`Page`] (template name + serialized context) or a
//! [`PageError`]. Neither renders anything by itself: the response carries
//! the pending page in its extensions and [`render_pages`] turns it into HTML
//! on the way out. The rendered response keeps a [`RenderedTemplate`]
//! extension so callers (and tests) can inspect which template was used and
//! with what context.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{Html, IntoResponse, Response},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::problem::{Problem, ProblemResponse};
use crate::templates::Templates;

/// Identifies the handler that produced a page; exposed to templates as `view`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ViewInfo {
    pub name: &'static str,
    pub template: &'static str,
}

/// Template and context of a rendered response.
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub name: String,
    pub context: serde_json::Value,
}

#[derive(Debug, Clone)]
struct PendingPage {
    template: String,
    context: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct Page {
    status: StatusCode,
    template: String,
    context: serde_json::Value,
}

impl Page {
    pub fn new(template: impl Into<String>, context: impl Serialize) -> Self {
        let template = template.into();
        match serde_json::to_value(context) {
            Ok(context) => Self {
                status: StatusCode::OK,
                template,
                context,
            },
            Err(e) => {
                tracing::error!(template = %template, error = %e, "page context is not serializable");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    template: "500.html".into(),
                    context: json!({}),
                }
            }
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let mut resp = self.status.into_response();
        resp.extensions_mut().insert(PendingPage {
            template: self.template,
            context: self.context,
        });
        resp
    }
}

/// Errors surfaced by page handlers as status pages.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PageError {
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound(detail.into())
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden(detail.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (template, detail) = match self {
            Self::NotFound(detail) => ("404.html", detail),
            Self::Forbidden(detail) => ("403.html", detail),
            Self::Internal(e) => {
                tracing::error!(error = ?e, "request failed");
                ("500.html", String::new())
            }
        };
        Page::new(template, json!({ "detail": detail }))
            .with_status(status)
            .into_response()
    }
}

/// Fallback for unmatched routes.
pub async fn not_found_page() -> PageError {
    PageError::not_found("The requested resource was not found on this server.")
}

/// `Accept` asks for JSON and not for HTML.
fn prefers_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json") && !accept.contains("text/html"))
}

/// Render pending pages. Error pages become RFC 9457 problems for JSON clients.
pub async fn render_pages(
    State(templates): State<Arc<Templates>>,
    req: Request,
    next: Next,
) -> Response {
    let wants_json = prefers_json(req.headers());
    let path = req.uri().path().to_owned();
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let mut resp = next.run(req).await;
    let Some(pending) = resp.extensions_mut().remove::<PendingPage>() else {
        return resp;
    };

    let status = resp.status();
    if wants_json && (status.is_client_error() || status.is_server_error()) {
        let detail = pending
            .context
            .get("detail")
            .and_then(|d| d.as_str())
            .unwrap_or_default();
        let mut problem = Problem::for_status(status, detail).with_instance(path);
        if let Some(id) = request_id {
            problem = problem.with_request_id(id);
        }
        return ProblemResponse(problem).into_response();
    }

    match templates.render(&pending.template, &pending.context) {
        Ok(html) => {
            let (mut parts, _) = resp.into_parts();
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            parts.extensions.insert(RenderedTemplate {
                name: pending.template,
                context: pending.context,
            });
            Response::from_parts(parts, Body::from(html))
        }
        Err(e) => {
            tracing::error!(template = %pending.template, error = %e, "template rendering failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Server Error (500)</h1>"),
            )
                .into_response()
        }
    }
}

/// Install [`render_pages`] on every route currently in `router`.
pub fn with_pages(router: Router, templates: Arc<Templates>) -> Router {
    router.layer(from_fn_with_state(templates, render_pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::UrlRegistry;
    use axum::routing::get;
    use tower::ServiceExt;

    async fn hello() -> Page {
        let view = ViewInfo {
            name: "hello",
            template: "hello.html",
        };
        Page::new("hello.html", json!({ "name": "reader", "view": view }))
    }

    async fn missing() -> Result<Page, PageError> {
        Err(PageError::not_found("No book matches the given query."))
    }

    fn app() -> Router {
        let templates = Arc::new(Templates::new(Arc::new(UrlRegistry::default())));
        templates
            .add_template("hello.html", "Hello {{ name }}".into())
            .unwrap();
        let router = Router::new()
            .route("/hello", get(hello))
            .route("/missing", get(missing))
            .fallback(not_found_page);
        with_pages(router, templates)
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn page_is_rendered_with_context_exposed() {
        let resp = app()
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let rendered = resp.extensions().get::<RenderedTemplate>().cloned().unwrap();
        assert_eq!(rendered.name, "hello.html");
        assert_eq!(rendered.context["view"]["name"], "hello");
        assert_eq!(body_text(resp).await, "Hello reader");
    }

    #[tokio::test]
    async fn errors_render_status_pages() {
        let resp = app()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let rendered = resp.extensions().get::<RenderedTemplate>().cloned().unwrap();
        assert_eq!(rendered.name, "404.html");
        assert!(body_text(resp).await.contains("No book matches the given query."));
    }

    #[tokio::test]
    async fn unknown_routes_use_fallback_page() {
        let resp = app()
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_text(resp).await.contains("Not Found"));
    }

    #[tokio::test]
    async fn json_clients_get_problem_details() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/missing")
                    .header(header::ACCEPT, "application/json")
                    .header("x-request-id", "req-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            crate::api::problem::APPLICATION_PROBLEM_JSON
        );
        let problem: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(problem["status"], 404);
        assert_eq!(problem["instance"], "/missing");
        assert_eq!(problem["request_id"], "req-1");
    }

    #[test]
    fn internal_errors_map_to_500() {
        let err = PageError::from(anyhow::anyhow!("db down"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(PageError::forbidden("x").status(), StatusCode::FORBIDDEN);
    }
}
