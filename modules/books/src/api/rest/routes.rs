use accounts::AccountsApi;
use axum::{routing::get, Extension, Router};
use modkit::{NamedRoutes, UrlRegistry};
use std::sync::Arc;

use crate::api::rest::handlers;
use crate::domain::service::Service;

pub fn register_routes(
    router: Router,
    urls: &UrlRegistry,
    service: Arc<Service>,
    accounts: Arc<dyn AccountsApi>,
) -> anyhow::Result<Router> {
    let routes = Router::new()
        .named_route(urls, "book_list", "/books/", get(handlers::book_list))?
        .named_route(urls, "book_detail", "/books/{id}/", get(handlers::book_detail))?
        .layer(Extension(service))
        .layer(Extension(accounts));

    Ok(router.merge(routes))
}
