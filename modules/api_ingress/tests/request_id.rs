//! Request ids through the assembled ingress stack: generated or propagated,
//! visible to handlers, and carried into error pages and problems.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    extract::Extension,
    http::{header, Request, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use modkit::{
    Module, ModuleCtx, ModuleCtxBuilder, ModuleRegistry, Page, PageError, RenderedTemplate,
    RestfulModule,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use api_ingress::request_id::XRequestId;

struct ProbeModule;

#[async_trait::async_trait]
impl Module for ProbeModule {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        ctx.templates()
            .add_template("whoami.html", "request {{ request_id }}".to_string())?;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestfulModule for ProbeModule {
    fn register_rest(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        Ok(router
            .route("/whoami/", get(whoami))
            .route("/broken/", get(broken)))
    }
}

async fn whoami(Extension(XRequestId(request_id)): Extension<XRequestId>) -> Page {
    Page::new("whoami.html", json!({ "request_id": request_id }))
}

async fn broken() -> Result<Page, PageError> {
    Err(PageError::Internal(anyhow::anyhow!("storage is unavailable")))
}

async fn app() -> Router {
    let mut b = ModuleRegistry::builder();
    api_ingress::register(&mut b);
    let probe = Arc::new(ProbeModule);
    b.register_core_with_meta("probe", &[], probe.clone());
    b.register_rest_with_meta("probe", probe);
    let registry = b.build_topo_sorted().unwrap();

    let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
    registry.run_init_phase(&ctx).await.unwrap();
    registry.run_rest_phase(&ctx, Router::new()).unwrap()
}

async fn send(uri: &str, request_id: Option<&str>, accept: Option<&str>) -> Response {
    let mut req = Request::builder().uri(uri);
    if let Some(id) = request_id {
        req = req.header("x-request-id", id);
    }
    if let Some(accept) = accept {
        req = req.header(header::ACCEPT, accept);
    }
    app()
        .await
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn request_id(resp: &Response) -> Option<String> {
    resp.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let resp = send("/whoami/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let id = request_id(&resp).expect("x-request-id should be generated");
    assert!(!id.is_empty());

    let page = resp.extensions().get::<RenderedTemplate>().cloned().unwrap();
    assert_eq!(page.context["request_id"], id.as_str());
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let resp = send("/whoami/", Some("abc-123"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(request_id(&resp).as_deref(), Some("abc-123"));

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"request abc-123");
}

#[tokio::test]
async fn failing_page_renders_server_error_page() {
    let resp = send("/broken/", Some("error-test-123"), Some("text/html")).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(request_id(&resp).as_deref(), Some("error-test-123"));

    let page = resp.extensions().get::<RenderedTemplate>().cloned().unwrap();
    assert_eq!(page.name, "500.html");
}

#[tokio::test]
async fn failing_page_is_a_problem_with_request_id_for_json_clients() {
    let resp = send("/broken/", Some("error-test-123"), Some("application/json")).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        modkit::api::problem::APPLICATION_PROBLEM_JSON
    );

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let problem: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(problem["status"], 500);
    assert_eq!(problem["title"], "Internal Server Error");
    assert_eq!(problem["instance"], "/broken/");
    assert_eq!(problem["request_id"], "error-test-123");
}
