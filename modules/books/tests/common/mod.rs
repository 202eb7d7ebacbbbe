//! Shared harness: ingress, accounts and books on one in-memory SQLite DB.
#![allow(dead_code)]

use std::sync::Arc;

use accounts::{AccountsApi, NewUser, User};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use books::{Book, BooksApi, NewBook};
use modkit::{ModuleCtxBuilder, ModuleRegistry, RenderedTemplate};
use modkit_db::{ConnectOpts, DbHandle};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub db: Arc<DbHandle>,
    pub accounts: Arc<dyn AccountsApi>,
    pub books: Arc<dyn BooksApi>,
}

pub async fn app() -> TestApp {
    let db = Arc::new(
        DbHandle::connect("sqlite::memory:", ConnectOpts::default())
            .await
            .expect("Failed to connect to test database"),
    );

    let mut b = ModuleRegistry::builder();
    api_ingress::register(&mut b);
    books::register(&mut b);
    accounts::register(&mut b);
    let registry = b.build_topo_sorted().unwrap();

    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_db(db.clone())
        .build();
    modkit::bootstrap(&registry, &ctx).await.unwrap();
    let router = registry.run_rest_phase(&ctx, Router::new()).unwrap();

    TestApp {
        router,
        db,
        accounts: ctx.client_hub().get::<dyn AccountsApi>().unwrap(),
        books: ctx.client_hub().get::<dyn BooksApi>().unwrap(),
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn reviewer(&self) -> User {
        self.accounts
            .create_user(NewUser::new("reviewuser", "reviewuser@email.com", "testpass123"))
            .await
            .unwrap()
    }

    pub async fn test_book(&self) -> Book {
        self.books
            .create_book(NewBook::new("Test Book", "Test Author", Decimal::new(1999, 2)))
            .await
            .unwrap()
    }
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

pub fn assert_status(resp: &Response, status: StatusCode) {
    assert_eq!(resp.status(), status, "unexpected status for response");
}
