use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewUser, Session, User};
use crate::domain::error::DomainError;
use crate::domain::password::{self, PasswordPolicy};
use crate::domain::repo::{DuplicateUsername, SessionsRepository, UsersRepository};
use crate::domain::validation::{normalize_email, validate_username};

const SESSION_KEY_BYTES: usize = 32;

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub password_policy: PasswordPolicy,
    pub session_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            password_policy: PasswordPolicy::default(),
            session_ttl: Duration::days(14),
        }
    }
}

/// Privilege flags a creation entry point assigns.
#[derive(Debug, Clone, Copy)]
struct Flags {
    is_staff: bool,
    is_superuser: bool,
}

/// User store and login sessions.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    users: Arc<dyn UsersRepository>,
    sessions: Arc<dyn SessionsRepository>,
    config: ServiceConfig,
}

impl Service {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        sessions: Arc<dyn SessionsRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            config,
        }
    }

    pub fn password_policy(&self) -> &PasswordPolicy {
        &self.config.password_policy
    }

    pub fn session_ttl(&self) -> Duration {
        self.config.session_ttl
    }

    #[instrument(name = "accounts.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(name = "accounts.service.find_by_username", skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.users
            .find_by_username(username)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    #[instrument(
        name = "accounts.service.create_user",
        skip(self, new_user),
        fields(username = %new_user.username)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        self.create_with_flags(
            new_user,
            Flags {
                is_staff: false,
                is_superuser: false,
            },
        )
        .await
    }

    #[instrument(
        name = "accounts.service.create_superuser",
        skip(self, new_user),
        fields(username = %new_user.username)
    )]
    pub async fn create_superuser(&self, new_user: NewUser) -> Result<User, DomainError> {
        self.create_with_flags(
            new_user,
            Flags {
                is_staff: true,
                is_superuser: true,
            },
        )
        .await
    }

    async fn create_with_flags(&self, new_user: NewUser, flags: Flags) -> Result<User, DomainError> {
        info!("Creating new user");

        let username = new_user.username.trim().to_string();
        validate_username(&username).map_err(|m| DomainError::validation("username", m))?;
        if new_user.password.is_empty() {
            return Err(DomainError::validation(
                "password",
                "The given password must be set",
            ));
        }

        if self
            .users
            .username_exists(&username)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        {
            return Err(DomainError::username_taken(username));
        }

        let user = User {
            id: Uuid::new_v4(),
            username,
            email: normalize_email(&new_user.email),
            password_hash: password::hash_password(&new_user.password)?,
            is_active: true,
            is_staff: flags.is_staff,
            is_superuser: flags.is_superuser,
            date_joined: Utc::now(),
            last_login: None,
        };

        // A concurrent sign-up can win the race past `username_exists`.
        self.users.insert(user.clone()).await.map_err(|e| {
            match e.downcast_ref::<DuplicateUsername>() {
                Some(DuplicateUsername(name)) => DomainError::username_taken(name.clone()),
                None => DomainError::database(e.to_string()),
            }
        })?;

        info!(user_id = %user.id, "Successfully created user");
        Ok(user)
    }

    /// Never errors: mismatches and malformed hashes are both `false`.
    pub fn check_password(&self, user: &User, password: &str) -> bool {
        password::verify_password(password, &user.password_hash)
    }

    /// The active user with these credentials, if any.
    #[instrument(name = "accounts.service.authenticate", skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let Some(user) = self.find_by_username(username.trim()).await? else {
            debug!("Unknown username");
            return Ok(None);
        };
        if !user.is_active || !self.check_password(&user, password) {
            debug!("Credentials rejected");
            return Ok(None);
        }
        Ok(Some(user))
    }

    /// Open a session for the user and stamp `last_login`.
    #[instrument(name = "accounts.service.login", skip(self, user), fields(user_id = %user.id))]
    pub async fn login(&self, user: &User) -> Result<Session, DomainError> {
        let now = Utc::now();
        let key_bytes: [u8; SESSION_KEY_BYTES] = rand::random();
        let session = Session {
            key: hex::encode(key_bytes),
            user_id: user.id,
            expires_at: now + self.config.session_ttl,
        };

        self.sessions
            .insert(session.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        self.users
            .set_last_login(user.id, now)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!("User logged in");
        Ok(session)
    }

    #[instrument(name = "accounts.service.logout", skip_all)]
    pub async fn logout(&self, key: &str) -> Result<(), DomainError> {
        let removed = self
            .sessions
            .delete(key)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!(removed, "Session closed");
        Ok(())
    }

    /// Resolve a session cookie. Expired sessions are removed on sight.
    #[instrument(name = "accounts.service.user_for_session", skip_all)]
    pub async fn user_for_session(&self, key: &str) -> Result<Option<User>, DomainError> {
        let Some(session) = self
            .sessions
            .find(key)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
        else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            debug!("Session expired");
            self.logout(key).await?;
            return Ok(None);
        }

        let user = self
            .users
            .find_by_id(session.user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        Ok(user.filter(|u| u.is_active))
    }
}
