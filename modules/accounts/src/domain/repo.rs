use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{Session, User};

/// Returned by [`UsersRepository::insert`] when the username is already stored.
#[derive(Debug, thiserror::Error)]
#[error("username '{0}' is already stored")]
pub struct DuplicateUsername(pub String);

/// Port for the domain layer: user persistence.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;
    /// Insert a fully-formed user; the service computes id, hash and flags.
    /// A username collision surfaces as [`DuplicateUsername`].
    async fn insert(&self, u: User) -> anyhow::Result<()>;
    async fn set_last_login(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()>;
}

/// Port for the domain layer: login sessions.
#[async_trait]
pub trait SessionsRepository: Send + Sync {
    async fn insert(&self, s: Session) -> anyhow::Result<()>;
    async fn find(&self, key: &str) -> anyhow::Result<Option<Session>>;
    /// Returns true if a row was deleted.
    async fn delete(&self, key: &str) -> anyhow::Result<bool>;
}
