//! ModKit runtime runner.
//!
//! One stable [`ModuleCtx`] is built up front and reused across all phases
//! (init → db → rest → start → wait → stop). Shutdown is driven by OS signals,
//! an external `CancellationToken`, or an arbitrary future.

use crate::context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

/// How the runtime should provide a database to modules.
pub enum DbOptions {
    /// `ModuleCtx::db()` is `None`; the db phase is skipped.
    None,
    /// An already connected handle shared by every module.
    Existing(Arc<modkit_db::DbHandle>),
}

/// How the runtime should decide when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals (Ctrl+C / SIGTERM).
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// An arbitrary future; when it completes, we initiate shutdown.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

pub struct RunOptions {
    pub registry: ModuleRegistry,
    /// Provider of module config sections (raw JSON by module name).
    pub modules_cfg: Arc<dyn ConfigProvider>,
    pub db: DbOptions,
    pub shutdown: ShutdownOptions,
}

/// Init and migrate every module. Used on its own by one-shot commands.
pub async fn bootstrap(registry: &ModuleRegistry, base_ctx: &ModuleCtx) -> anyhow::Result<()> {
    tracing::info!("Phase: init");
    registry.run_init_phase(base_ctx).await?;

    if let Some(db) = base_ctx.db() {
        tracing::info!("Phase: db");
        registry.run_db_phase(&db).await?;
    }
    Ok(())
}

/// Full cycle: init → db → rest (sync) → start → wait → stop.
pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let cancel = match &opts.shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };

    match opts.shutdown {
        ShutdownOptions::Signals => {
            let c = cancel.clone();
            tokio::spawn(async move {
                match shutdown::wait_for_shutdown().await {
                    Ok(()) => tracing::info!("shutdown: signal received"),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "shutdown: signal listener failed; falling back to ctrl_c()"
                        );
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
                c.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            let c = cancel.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                c.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::debug!("shutdown: external token controls lifecycle");
        }
    }

    let mut builder =
        ModuleCtxBuilder::new(cancel.clone()).with_config_provider(opts.modules_cfg.clone());
    if let DbOptions::Existing(db) = &opts.db {
        builder = builder.with_db(db.clone());
    }
    let base_ctx = builder.build();
    let registry = opts.registry;

    bootstrap(&registry, &base_ctx).await?;

    tracing::info!("Phase: rest");
    let _ = registry.run_rest_phase(&base_ctx, axum::Router::new())?;

    tracing::info!("Phase: start");
    registry.run_start_phase(cancel.clone()).await?;

    cancel.cancelled().await;

    tracing::info!("Phase: stop");
    registry.run_stop_phase(cancel).await;
    Ok(())
}
