use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::AccountsApi,
    error::AccountsError,
    model::{NewUser, User},
};
use crate::domain::{error::DomainError, service::Service};

/// In-process implementation of [`AccountsApi`] backed by the domain service.
pub struct AccountsLocalClient {
    service: Arc<Service>,
}

impl AccountsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountsError> {
        self.service
            .find_by_username(username)
            .await
            .map_err(Into::into)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AccountsError> {
        self.service.create_user(new_user).await.map_err(Into::into)
    }

    async fn create_superuser(&self, new_user: NewUser) -> Result<User, AccountsError> {
        self.service
            .create_superuser(new_user)
            .await
            .map_err(Into::into)
    }

    fn check_password(&self, user: &User, password: &str) -> bool {
        self.service.check_password(user, password)
    }

    async fn user_for_session(&self, key: &str) -> Result<Option<User>, AccountsError> {
        self.service.user_for_session(key).await.map_err(Into::into)
    }
}

impl From<DomainError> for AccountsError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UserNotFound { id } => AccountsError::not_found(id),
            DomainError::UsernameTaken { username } => AccountsError::conflict(username),
            DomainError::Validation { field, message } => {
                AccountsError::validation(format!("{field}: {message}"))
            }
            DomainError::Hashing { message } | DomainError::Database { message } => {
                tracing::error!(error = %message, "accounts store failure");
                AccountsError::internal()
            }
        }
    }
}
