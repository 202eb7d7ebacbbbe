use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::client_hub::ClientHub;
use crate::templates::Templates;
use crate::urls::UrlRegistry;

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

impl ConfigProvider for runtime::AppConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.module_config(module_name)
    }
}

/// Shared, read-mostly wiring handed to every module phase.
#[derive(Clone)]
pub struct ModuleCtx {
    db: Option<Arc<modkit_db::DbHandle>>,
    config_provider: Option<Arc<dyn ConfigProvider>>,
    client_hub: Arc<ClientHub>,
    urls: Arc<UrlRegistry>,
    templates: Arc<Templates>,
    cancellation_token: CancellationToken,
    module_name: Option<Arc<str>>,
}

pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(token: CancellationToken) -> Self {
        let urls = Arc::new(UrlRegistry::default());
        let templates = Arc::new(Templates::new(urls.clone()));
        Self {
            inner: ModuleCtx {
                db: None,
                config_provider: None,
                client_hub: Arc::new(ClientHub::default()),
                urls,
                templates,
                cancellation_token: token,
                module_name: None,
            },
        }
    }

    pub fn with_db(mut self, db: Arc<modkit_db::DbHandle>) -> Self {
        self.inner.db = Some(db);
        self
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    pub fn with_client_hub(mut self, hub: Arc<ClientHub>) -> Self {
        self.inner.client_hub = hub;
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    /// Scope context to a specific module name (used by the registry).
    pub fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn db(&self) -> Option<Arc<modkit_db::DbHandle>> {
        self.db.clone()
    }

    pub fn db_required(&self) -> anyhow::Result<Arc<modkit_db::DbHandle>> {
        self.db.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "module '{}' requires a database, but none is configured",
                self.current_module().unwrap_or("?")
            )
        })
    }

    pub fn client_hub(&self) -> Arc<ClientHub> {
        self.client_hub.clone()
    }

    pub fn urls(&self) -> Arc<UrlRegistry> {
        self.urls.clone()
    }

    pub fn templates(&self) -> Arc<Templates> {
        self.templates.clone()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Lenient: deserialize the module's config into `T`, falling back to
    /// `T::default()` if the section is missing or invalid.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> T {
        match (&self.module_name, &self.config_provider) {
            (Some(name), Some(p)) => match p.get_module_config(name) {
                Some(v) => serde_json::from_value::<T>(v.clone()).unwrap_or_else(|e| {
                    tracing::warn!(module = %name, error = %e, "invalid module config; using defaults");
                    T::default()
                }),
                None => T::default(),
            },
            _ => T::default(),
        }
    }

    /// Strict: deserialize the module's config into `T` or fail with the module name.
    pub fn module_config_required<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let name = self
            .module_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("context is not scoped to a module"))?;
        let prov = self
            .config_provider
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no ConfigProvider"))?;
        let val = prov
            .get_module_config(name)
            .ok_or_else(|| anyhow::anyhow!("missing module config: {name}"))?;
        serde_json::from_value(val.clone()).map_err(|e| anyhow::anyhow!("invalid {name} config: {e}"))
    }
}
