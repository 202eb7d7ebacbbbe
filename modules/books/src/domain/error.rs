use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Book not found: {id}")]
    BookNotFound { id: Uuid },

    #[error("User not found: {id}")]
    AuthorNotFound { id: Uuid },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("User directory error: {message}")]
    Directory { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn book_not_found(id: Uuid) -> Self {
        Self::BookNotFound { id }
    }

    pub fn author_not_found(id: Uuid) -> Self {
        Self::AuthorNotFound { id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
