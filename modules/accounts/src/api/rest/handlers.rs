use std::sync::Arc;

use axum::{
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use modkit::{CsrfToken, Page, PageError, UrlRegistry, ViewInfo};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::rest::extract::SESSION_COOKIE;
use crate::api::rest::forms::{FormErrors, FormView, LoginForm, LogoutForm, SignupForm, INVALID_LOGIN};
use crate::contract::model::NewUser;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

pub const SIGNUP_VIEW: ViewInfo = ViewInfo {
    name: "signup",
    template: "registration/signup.html",
};

pub const LOGIN_VIEW: ViewInfo = ViewInfo {
    name: "login",
    template: "registration/login.html",
};

/// Redirect targets and cookie flags used by the auth handlers.
pub struct AuthSettings {
    pub urls: Arc<UrlRegistry>,
    pub login_redirect: String,
    pub logout_redirect: String,
    pub secure_cookies: bool,
}

impl AuthSettings {
    /// Path of a named route, `/` when the route is not registered.
    pub fn path_of(&self, route: &str) -> String {
        self.urls.reverse(route, &[]).unwrap_or_else(|e| {
            warn!(route, error = %e, "redirect target is not a known route");
            "/".to_string()
        })
    }
}

#[derive(Serialize)]
struct FormContext<'a> {
    view: ViewInfo,
    form: FormView,
    csrf_token: &'a str,
}

fn form_page(view: ViewInfo, form: FormView, csrf: &CsrfToken) -> Page {
    Page::new(
        view.template,
        FormContext {
            view,
            form,
            csrf_token: csrf.as_str(),
        },
    )
}

fn store_failure(e: DomainError) -> PageError {
    PageError::Internal(e.into())
}

/// GET /signup/
pub async fn signup_page(Extension(svc): Extension<Arc<Service>>, csrf: CsrfToken) -> Page {
    info!("Rendering sign-up form");
    form_page(SIGNUP_VIEW, SignupForm::unbound(svc.password_policy()), &csrf)
}

/// POST /signup/
pub async fn signup_submit(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<AuthSettings>>,
    csrf: CsrfToken,
    Form(form): Form<SignupForm>,
) -> Result<Response, PageError> {
    csrf.verify(form.csrfmiddlewaretoken.as_deref())?;
    let policy = svc.password_policy();

    let valid = match form.validate(policy) {
        Ok(valid) => valid,
        Err(errors) => {
            info!("Sign-up form rejected");
            return Ok(form_page(SIGNUP_VIEW, form.view(&errors, policy, true), &csrf).into_response());
        }
    };

    let new_user = NewUser {
        username: valid.username,
        email: valid.email,
        password: valid.password,
    };
    let mut errors = FormErrors::default();
    match svc.create_user(new_user).await {
        Ok(user) => {
            info!(user_id = %user.id, "User signed up");
            return Ok(Redirect::to(&settings.path_of("login")).into_response());
        }
        Err(e @ DomainError::UsernameTaken { .. }) => errors.add("username", e.to_string()),
        Err(DomainError::Validation { field, message }) => match field.as_str() {
            "username" => errors.add("username", message),
            "password" => errors.add("password1", message),
            _ => errors.add_non_field(message),
        },
        Err(e) => return Err(store_failure(e)),
    }
    Ok(form_page(SIGNUP_VIEW, form.view(&errors, policy, true), &csrf).into_response())
}

/// GET /accounts/login/
pub async fn login_page(csrf: CsrfToken) -> Page {
    info!("Rendering login form");
    form_page(LOGIN_VIEW, LoginForm::unbound(), &csrf)
}

/// POST /accounts/login/
pub async fn login_submit(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<AuthSettings>>,
    csrf: CsrfToken,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    csrf.verify(form.csrfmiddlewaretoken.as_deref())?;

    let (username, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => {
            return Ok(form_page(LOGIN_VIEW, form.view(&errors, true), &csrf).into_response());
        }
    };

    let Some(user) = svc
        .authenticate(username, password)
        .await
        .map_err(store_failure)?
    else {
        info!("Login rejected");
        let mut errors = FormErrors::default();
        errors.add_non_field(INVALID_LOGIN);
        return Ok(form_page(LOGIN_VIEW, form.view(&errors, true), &csrf).into_response());
    };

    let session = svc.login(&user).await.map_err(store_failure)?;
    let cookie = Cookie::build((SESSION_COOKIE, session.key))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookies)
        .build();

    let target = settings.path_of(&settings.login_redirect);
    Ok((jar.add(cookie), Redirect::to(&target)).into_response())
}

/// POST /accounts/logout/
pub async fn logout(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<AuthSettings>>,
    csrf: CsrfToken,
    jar: CookieJar,
    Form(form): Form<LogoutForm>,
) -> Result<Response, PageError> {
    csrf.verify(form.csrfmiddlewaretoken.as_deref())?;

    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        svc.logout(cookie.value()).await.map_err(store_failure)?;
        info!("User logged out");
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let target = settings.path_of(&settings.logout_redirect);
    Ok((jar, Redirect::to(&target)).into_response())
}
