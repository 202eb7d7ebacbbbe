use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Output port: who wrote a review. Backed by the accounts module.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Username of an existing user, `None` if there is no such user.
    async fn username(&self, id: Uuid) -> Result<Option<String>, DomainError>;
}
