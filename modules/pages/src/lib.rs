//! Site-wide pages that belong to no single feature module.

pub mod module;
pub use module::{register, Pages, MODULE_NAME};

#[doc(hidden)]
pub mod api;
