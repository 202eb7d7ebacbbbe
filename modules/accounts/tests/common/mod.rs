//! Shared harness: a full ingress + accounts stack on in-memory SQLite.
#![allow(dead_code)]

use std::sync::Arc;

use accounts::AccountsApi;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use modkit::{ModuleCtxBuilder, ModuleRegistry, RenderedTemplate};
use modkit_db::{ConnectOpts, DbHandle};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub api: Arc<dyn AccountsApi>,
}

pub async fn test_db() -> Arc<DbHandle> {
    Arc::new(
        DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .expect("Failed to connect to test database"),
    )
}

pub async fn app() -> TestApp {
    let mut b = ModuleRegistry::builder();
    api_ingress::register(&mut b);
    accounts::register(&mut b);
    let registry = b.build_topo_sorted().unwrap();

    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_db(test_db().await)
        .build();
    modkit::bootstrap(&registry, &ctx).await.unwrap();
    let router = registry.run_rest_phase(&ctx, Router::new()).unwrap();
    let api = ctx.client_hub().get::<dyn AccountsApi>().unwrap();

    TestApp { router, api }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Fetch a page to obtain the CSRF cookie; returns the token.
    pub async fn csrf_token(&self) -> String {
        let resp = self.get("/accounts/login/").await;
        cookie_value(&resp, "csrftoken").expect("csrftoken cookie is set")
    }

    /// POST a urlencoded form carrying the CSRF cookie and field.
    pub async fn post_form(
        &self,
        uri: &str,
        csrf: Option<&str>,
        fields: &[(&str, &str)],
        session: Option<&str>,
    ) -> Response {
        let mut body = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in fields {
            body.append_pair(k, v);
        }
        let mut cookies = Vec::new();
        if let Some(token) = csrf {
            body.append_pair("csrfmiddlewaretoken", token);
            cookies.push(format!("csrftoken={token}"));
        }
        if let Some(key) = session {
            cookies.push(format!("sessionid={key}"));
        }

        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if !cookies.is_empty() {
            req = req.header(header::COOKIE, cookies.join("; "));
        }
        self.send(req.body(Body::from(body.finish())).unwrap()).await
    }
}

pub fn cookie_value(resp: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|c| {
            c.strip_prefix(&prefix)
                .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        })
}

pub fn rendered(resp: &Response) -> RenderedTemplate {
    resp.extensions()
        .get::<RenderedTemplate>()
        .cloned()
        .expect("response was rendered from a template")
}

pub async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
