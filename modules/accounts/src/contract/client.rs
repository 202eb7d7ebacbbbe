use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::AccountsError,
    model::{NewUser, User},
};

/// Public API of the accounts module, published to the `ClientHub`.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AccountsError>;

    /// Regular user: active, no staff or superuser rights.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AccountsError>;

    /// Privileged user: active, staff and superuser.
    async fn create_superuser(&self, new_user: NewUser) -> Result<User, AccountsError>;

    /// `false` on mismatch or an unreadable stored hash.
    fn check_password(&self, user: &User, password: &str) -> bool;

    /// The active user owning a live session, if any.
    async fn user_for_session(&self, key: &str) -> Result<Option<User>, AccountsError>;
}
