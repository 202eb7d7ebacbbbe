//! Field rules shared by the service and the HTML forms.

pub const USERNAME_MAX_LENGTH: usize = 150;

const USERNAME_EXTRA_CHARS: &[char] = &['@', '.', '+', '-', '_'];

/// Letters, digits and `@ . + - _`, 1 to 150 characters.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field is required.".to_string());
    }
    let len = username.chars().count();
    if len > USERNAME_MAX_LENGTH {
        return Err(format!(
            "Ensure this value has at most {USERNAME_MAX_LENGTH} characters (it has {len})."
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || USERNAME_EXTRA_CHARS.contains(&c))
    {
        return Err("Enter a valid username. This value may contain only letters, \
                    numbers, and @/./+/-/_ characters."
            .to_string());
    }
    Ok(())
}

/// Lower-case the domain part; the local part is case-sensitive.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Empty is allowed; otherwise `local@domain` without whitespace.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Ok(());
    }
    let valid = match email.rsplit_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err("Enter a valid email address.".to_string())
    }
}
