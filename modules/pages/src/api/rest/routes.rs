use std::sync::Arc;

use accounts::AccountsApi;
use axum::{routing::get, Extension, Router};
use modkit::{NamedRoutes, UrlRegistry};

use crate::api::rest::handlers;

pub fn register_routes(
    router: Router,
    urls: &UrlRegistry,
    accounts: Arc<dyn AccountsApi>,
) -> anyhow::Result<Router> {
    let routes = Router::new()
        .named_route(urls, "home", "/", get(handlers::home))?
        .layer(Extension(accounts));

    Ok(router.merge(routes))
}
