use serde::{Deserialize, Serialize};

/// Configuration for the accounts module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
    /// Route name to redirect to after login.
    #[serde(default = "default_redirect")]
    pub login_redirect: String,
    /// Route name to redirect to after logout.
    #[serde(default = "default_redirect")]
    pub logout_redirect: String,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            session_ttl_hours: default_session_ttl_hours(),
            login_redirect: default_redirect(),
            logout_redirect: default_redirect(),
            secure_cookies: false,
        }
    }
}

fn default_min_password_length() -> usize {
    8
}

fn default_session_ttl_hours() -> u32 {
    24 * 14
}

fn default_redirect() -> String {
    "home".to_string()
}
