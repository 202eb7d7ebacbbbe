//! SeaORM-backed implementations of the domain ports.
//!
//! Generic over `C: ConnectionTrait`, so they work with a `DatabaseConnection`
//! or a transaction.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    SqlErr,
};
use uuid::Uuid;

use crate::contract::model::{Session, User};
use crate::domain::repo::{DuplicateUsername, SessionsRepository, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};
use crate::infra::storage::session_entity::{ActiveModel as SessionAM, Entity as SessionEntity};

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("find_by_username failed")?;
        Ok(found.map(Into::into))
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let count = UserEntity::find()
            .filter(Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("username_exists failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, u: User) -> anyhow::Result<()> {
        let username = u.username.clone();
        let m = UserAM {
            id: Set(u.id),
            username: Set(u.username),
            email: Set(u.email),
            password_hash: Set(u.password_hash),
            is_active: Set(u.is_active),
            is_staff: Set(u.is_staff),
            is_superuser: Set(u.is_superuser),
            date_joined: Set(u.date_joined),
            last_login: Set(u.last_login),
        };
        match m.insert(&self.conn).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(DuplicateUsername(username).into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert failed")),
        }
    }

    async fn set_last_login(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()> {
        let m = UserAM {
            id: Set(id),
            last_login: Set(Some(at)),
            ..Default::default()
        };
        let _ = m.update(&self.conn).await.context("set_last_login failed")?;
        Ok(())
    }
}

pub struct SeaOrmSessionsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmSessionsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> SessionsRepository for SeaOrmSessionsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, s: Session) -> anyhow::Result<()> {
        let m = SessionAM {
            key: Set(s.key),
            user_id: Set(s.user_id),
            expires_at: Set(s.expires_at),
        };
        let _ = m.insert(&self.conn).await.context("session insert failed")?;
        Ok(())
    }

    async fn find(&self, key: &str) -> anyhow::Result<Option<Session>> {
        let found = SessionEntity::find_by_id(key.to_string())
            .one(&self.conn)
            .await
            .context("session find failed")?;
        Ok(found.map(Into::into))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<bool> {
        let res = SessionEntity::delete_by_id(key.to_string())
            .exec(&self.conn)
            .await
            .context("session delete failed")?;
        Ok(res.rows_affected > 0)
    }
}
