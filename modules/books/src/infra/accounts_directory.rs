use std::sync::Arc;

use accounts::{AccountsApi, AccountsError};
use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::ports::UserDirectory;

/// [`UserDirectory`] adapter over the accounts client from the `ClientHub`.
pub struct AccountsDirectory {
    api: Arc<dyn AccountsApi>,
}

impl AccountsDirectory {
    pub fn new(api: Arc<dyn AccountsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl UserDirectory for AccountsDirectory {
    #[instrument(name = "books.accounts.username", skip(self), fields(user_id = %id))]
    async fn username(&self, id: Uuid) -> Result<Option<String>, DomainError> {
        match self.api.get_user(id).await {
            Ok(user) => Ok(Some(user.username)),
            Err(AccountsError::NotFound { .. }) => Ok(None),
            Err(e) => Err(DomainError::Directory {
                message: e.to_string(),
            }),
        }
    }
}
