//! # ModKit - modular server building blocks
//!
//! Modules implement a small set of capability traits and are wired into an
//! explicit [`ModuleRegistry`]. The runtime drives them through ordered phases:
//! init → DB migrations → REST wiring → start → stop.
//!
//! ## Example
//!
//! ```rust,ignore
//! use modkit::{DbOptions, ModuleRegistry, RunOptions, ShutdownOptions};
//!
//! let mut builder = ModuleRegistry::builder();
//! api_ingress::register(&mut builder);
//! accounts::register(&mut builder);
//! let registry = builder.build_topo_sorted()?;
//!
//! modkit::run(RunOptions {
//!     registry,
//!     modules_cfg: Arc::new(config),
//!     db: DbOptions::Existing(db),
//!     shutdown: ShutdownOptions::Signals,
//! })
//! .await?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

// Module system exports
pub mod contracts;
pub use crate::contracts::*;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod client_hub;
pub mod registry;

pub use client_hub::ClientHub;
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};

// JSON problem responses
pub mod api;
pub use api::problem::{Problem, ProblemResponse};

// HTML pages
pub mod csrf;
pub mod page;
pub mod templates;
pub mod urls;

pub use csrf::CsrfToken;
pub use page::{Page, PageError, RenderedTemplate, ViewInfo};
pub use templates::Templates;
pub use urls::{NamedRoutes, UrlError, UrlRegistry};

pub mod runtime;
pub use runtime::{bootstrap, run, DbOptions, RunOptions, ShutdownOptions};
