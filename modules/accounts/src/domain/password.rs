//! Argon2id password hashing and the password strength policy.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::domain::error::DomainError;

/// Hash with a fresh random salt; the result is a self-describing PHC string.
pub fn hash_password(plain: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| DomainError::Hashing {
            message: e.to_string(),
        })
}

/// Verify against a stored PHC string using the salt and parameters it carries.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "qwertyuiop",
    "iloveyou",
    "letmein1",
    "sunshine",
    "football",
    "baseball",
    "welcome1",
    "admin123",
    "trustno1",
];

/// Strength rules applied to new passwords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    /// Every rule the password breaks, as user-facing messages.
    pub fn check(&self, password: &str, username: &str) -> Vec<String> {
        let mut problems = Vec::new();

        if password.chars().count() < self.min_length {
            problems.push(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ));
        }

        let lowered = password.to_lowercase();
        let user = username.trim().to_lowercase();
        if !lowered.is_empty()
            && user.chars().count() >= 3
            && (lowered.contains(&user) || user.contains(&lowered))
        {
            problems.push("The password is too similar to the username.".to_string());
        }

        if COMMON_PASSWORDS.contains(&lowered.as_str()) {
            problems.push("This password is too common.".to_string());
        }

        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            problems.push("This password is entirely numeric.".to_string());
        }

        problems
    }
}
