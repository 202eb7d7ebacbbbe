// === PUBLIC CONTRACT ===
// Other modules depend on the contract and on the `CurrentUser` extractor only.
pub mod contract;

pub use contract::{client, error, model};
pub use contract::{AccountsApi, AccountsError, NewUser, Session, User};

// === MODULE DEFINITION ===
pub mod module;
pub use module::{register, Accounts, MODULE_NAME};

pub use api::rest::extract::{CurrentUser, SESSION_COOKIE};

// === INTERNAL MODULES ===
// Exposed for tests; not a stable API.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
