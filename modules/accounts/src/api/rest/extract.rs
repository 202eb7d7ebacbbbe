use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use modkit::PageError;
use serde::Serialize;
use uuid::Uuid;

use crate::contract::{client::AccountsApi, model::User};

pub const SESSION_COOKIE: &str = "sessionid";

/// The user behind the request's session cookie, if any.
///
/// Needs an `Extension<Arc<dyn AccountsApi>>` on the route.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// What templates get to see of a user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    pub fn summary(&self) -> Option<UserSummary> {
        self.0.as_ref().map(|u| UserSummary {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            is_staff: u.is_staff,
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let api = parts
            .extensions
            .get::<Arc<dyn AccountsApi>>()
            .cloned()
            .ok_or_else(|| PageError::Internal(anyhow::anyhow!("accounts client is not installed")))?;

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };

        let user = api
            .user_for_session(cookie.value())
            .await
            .map_err(|e| PageError::Internal(e.into()))?;
        Ok(Self(user))
    }
}
