//! HTML forms: raw submitted values, explicit validation, and the view
//! handed to templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::password::PasswordPolicy;
use crate::domain::validation::{
    normalize_email, validate_email, validate_username, USERNAME_MAX_LENGTH,
};

const REQUIRED: &str = "This field is required.";

pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Field-level and form-level error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }
}

/// Template view of a form.
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub name: &'static str,
    pub is_bound: bool,
    pub fields: Vec<FieldView>,
    pub non_field_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub required: bool,
    pub help_text: String,
    pub value: String,
    pub errors: Vec<String>,
}

struct FieldSpec {
    name: &'static str,
    label: &'static str,
    input_type: &'static str,
    required: bool,
}

impl FieldSpec {
    fn view(&self, value: &str, help_text: String, errors: &FormErrors) -> FieldView {
        FieldView {
            name: self.name,
            label: self.label,
            input_type: self.input_type,
            required: self.required,
            help_text,
            value: value.to_string(),
            errors: errors.field(self.name).to_vec(),
        }
    }
}

const USERNAME: FieldSpec = FieldSpec {
    name: "username",
    label: "Username",
    input_type: "text",
    required: true,
};
const EMAIL: FieldSpec = FieldSpec {
    name: "email",
    label: "Email address",
    input_type: "email",
    required: false,
};
const PASSWORD1: FieldSpec = FieldSpec {
    name: "password1",
    label: "Password",
    input_type: "password",
    required: true,
};
const PASSWORD2: FieldSpec = FieldSpec {
    name: "password2",
    label: "Password confirmation",
    input_type: "password",
    required: true,
};
const PASSWORD: FieldSpec = FieldSpec {
    name: "password",
    label: "Password",
    input_type: "password",
    required: true,
};

/// Registration form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
    pub csrfmiddlewaretoken: Option<String>,
}

/// Registration input that passed every form rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    pub const NAME: &'static str = "SignupForm";

    pub fn validate(&self, policy: &PasswordPolicy) -> Result<ValidSignup, FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if let Err(msg) = validate_username(username) {
            errors.add(USERNAME.name, msg);
        }

        let email = normalize_email(&self.email);
        if let Err(msg) = validate_email(&email) {
            errors.add(EMAIL.name, msg);
        }

        if self.password1.is_empty() {
            errors.add(PASSWORD1.name, REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add(PASSWORD2.name, REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add(PASSWORD2.name, "The two password fields didn't match.");
            } else {
                for msg in policy.check(&self.password1, username) {
                    errors.add(PASSWORD2.name, msg);
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ValidSignup {
            username: username.to_string(),
            email,
            password: self.password1.clone(),
        })
    }

    /// Passwords are never echoed back.
    pub fn view(&self, errors: &FormErrors, policy: &PasswordPolicy, is_bound: bool) -> FormView {
        FormView {
            name: Self::NAME,
            is_bound,
            fields: vec![
                USERNAME.view(
                    &self.username,
                    format!(
                        "Required. {USERNAME_MAX_LENGTH} characters or fewer. \
                         Letters, digits and @/./+/-/_ only."
                    ),
                    errors,
                ),
                EMAIL.view(&self.email, String::new(), errors),
                PASSWORD1.view(
                    "",
                    format!(
                        "Your password must contain at least {} characters and can't be entirely numeric.",
                        policy.min_length
                    ),
                    errors,
                ),
                PASSWORD2.view(
                    "",
                    "Enter the same password as before, for verification.".to_string(),
                    errors,
                ),
            ],
            non_field_errors: errors.non_field().to_vec(),
        }
    }

    pub fn unbound(policy: &PasswordPolicy) -> FormView {
        Self::default().view(&FormErrors::default(), policy, false)
    }
}

/// Login form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrfmiddlewaretoken: Option<String>,
}

impl LoginForm {
    pub const NAME: &'static str = "LoginForm";

    /// Presence only; credentials are checked by the service.
    pub fn validate(&self) -> Result<(&str, &str), FormErrors> {
        let mut errors = FormErrors::default();
        let username = self.username.trim();
        if username.is_empty() {
            errors.add(USERNAME.name, REQUIRED);
        }
        if self.password.is_empty() {
            errors.add(PASSWORD.name, REQUIRED);
        }
        if errors.is_empty() {
            Ok((username, self.password.as_str()))
        } else {
            Err(errors)
        }
    }

    pub fn view(&self, errors: &FormErrors, is_bound: bool) -> FormView {
        FormView {
            name: Self::NAME,
            is_bound,
            fields: vec![
                USERNAME.view(&self.username, String::new(), errors),
                PASSWORD.view("", String::new(), errors),
            ],
            non_field_errors: errors.non_field().to_vec(),
        }
    }

    pub fn unbound() -> FormView {
        Self::default().view(&FormErrors::default(), false)
    }
}

/// Logout carries nothing but the CSRF token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogoutForm {
    pub csrfmiddlewaretoken: Option<String>,
}
