//! HTTP host module: owns the base router, the global middleware stack and the
//! server loop. Page modules only contribute routes.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use axum::{middleware::from_fn, routing::get, Router};
use modkit::{ModuleCtx, RegistryBuilder};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

const STOP_TIMEOUT: Duration = Duration::from_secs(30);

/// Register the module with all of its capabilities.
pub fn register(b: &mut RegistryBuilder) {
    let m = Arc::new(ApiIngress::default());
    b.register_core_with_meta(MODULE_NAME, &[], m.clone());
    b.register_rest_host_with_meta(MODULE_NAME, m.clone());
    b.register_stateful_with_meta(MODULE_NAME, m);
}

pub struct ApiIngress {
    config: ArcSwap<ApiIngressConfig>,
    // Finalized router from the REST phase, taken by `start`.
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<JoinHandle<Result<()>>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Address the server is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Wrap the assembled routes with the global middleware stack.
    ///
    /// Innermost first: page rendering, CSRF cookie, body limit, CORS, timeout,
    /// request id into extensions, trace span, request id propagation/generation.
    pub fn build_router(&self, ctx: &ModuleCtx, router: Router) -> Router {
        let config = self.get_cached_config();

        let mut router = router.fallback(modkit::page::not_found_page);
        router = modkit::page::with_pages(router, ctx.templates());
        router = modkit::csrf::with_csrf(router);
        router = router.layer(RequestBodyLimitLayer::new(config.body_limit_bytes));
        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        if config.request_timeout_secs > 0 {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )));
        }

        let x_request_id = request_id::header();
        router
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    fn get_cached_config(&self) -> Arc<ApiIngressConfig> {
        self.config.load_full()
    }

    async fn serve(
        listener: tokio::net::TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>();
        tracing::debug!(bind_addr = %cfg.bind_addr, "api_ingress configured");
        self.config.store(Arc::new(cfg));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl modkit::contracts::RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        Ok(router.route("/health", get(web::health_check)))
    }

    fn rest_finalize(&self, ctx: &ModuleCtx, router: Router) -> Result<Router> {
        let router = self.build_router(ctx, router);
        *self.final_router.lock() = Some(router.clone());
        tracing::debug!("REST host finalized router");
        Ok(router)
    }
}

#[async_trait]
impl modkit::contracts::StatefulModule for ApiIngress {
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let cfg = self.get_cached_config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cfg.bind_addr, e))?;

        let router = self
            .final_router
            .lock()
            .take()
            .ok_or_else(|| anyhow::anyhow!("REST phase did not produce a router"))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        *self.local_addr.lock() = Some(local);
        tracing::info!("HTTP server bound on {}", local);

        let handle = tokio::spawn(Self::serve(listener, router, cancel));
        *self.server.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let handle = self.server.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };
        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(joined) => joined?,
            Err(_) => {
                tracing::warn!("HTTP server did not stop within {:?}", STOP_TIMEOUT);
                Ok(())
            }
        }
    }
}
