use crate::contract::model::{Session, User};
use crate::infra::storage::{entity, session_entity};

impl From<entity::Model> for User {
    fn from(m: entity::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            password_hash: m.password_hash,
            is_active: m.is_active,
            is_staff: m.is_staff,
            is_superuser: m.is_superuser,
            date_joined: m.date_joined,
            last_login: m.last_login,
        }
    }
}

impl From<session_entity::Model> for Session {
    fn from(m: session_entity::Model) -> Self {
        Self {
            key: m.key,
            user_id: m.user_id,
            expires_at: m.expires_at,
        }
    }
}
