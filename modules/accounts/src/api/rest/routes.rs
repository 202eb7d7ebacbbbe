use axum::{
    routing::{get, post},
    Extension, Router,
};
use modkit::{NamedRoutes, UrlRegistry};
use std::sync::Arc;

use crate::api::rest::handlers::{self, AuthSettings};
use crate::domain::service::Service;

pub fn register_routes(
    router: Router,
    urls: &UrlRegistry,
    service: Arc<Service>,
    settings: Arc<AuthSettings>,
) -> anyhow::Result<Router> {
    let routes = Router::new()
        .named_route(
            urls,
            "signup",
            "/signup/",
            get(handlers::signup_page).post(handlers::signup_submit),
        )?
        .named_route(
            urls,
            "login",
            "/accounts/login/",
            get(handlers::login_page).post(handlers::login_submit),
        )?
        .named_route(urls, "logout", "/accounts/logout/", post(handlers::logout))?
        .layer(Extension(service))
        .layer(Extension(settings));

    Ok(router.merge(routes))
}
