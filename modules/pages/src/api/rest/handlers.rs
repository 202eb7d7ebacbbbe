use accounts::{api::rest::extract::UserSummary, CurrentUser};
use modkit::{CsrfToken, Page, ViewInfo};
use serde::Serialize;

pub const HOME_VIEW: ViewInfo = ViewInfo {
    name: "home",
    template: "home.html",
};

#[derive(Debug, Serialize)]
struct HomeContext<'a> {
    view: ViewInfo,
    user: Option<UserSummary>,
    csrf_token: &'a str,
}

/// GET /
pub async fn home(current: CurrentUser, csrf: CsrfToken) -> Page {
    tracing::info!(authenticated = current.is_authenticated(), "Rendering home page");
    Page::new(
        HOME_VIEW.template,
        HomeContext {
            view: HOME_VIEW,
            user: current.summary(),
            csrf_token: csrf.as_str(),
        },
    )
}
