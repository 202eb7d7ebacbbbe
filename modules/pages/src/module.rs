use std::sync::Arc;

use accounts::AccountsApi;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use modkit::{Module, ModuleCtx, RegistryBuilder, RestfulModule};
use rust_embed::RustEmbed;
use tracing::{debug, info};

use crate::api::rest::routes;

pub const MODULE_NAME: &str = "pages";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct PageTemplates;

pub fn register(b: &mut RegistryBuilder) {
    let m = Arc::new(Pages::default());
    b.register_core_with_meta(MODULE_NAME, &[accounts::MODULE_NAME], m.clone());
    b.register_rest_with_meta(MODULE_NAME, m);
}

/// The home page.
#[derive(Default)]
pub struct Pages {
    accounts: ArcSwapOption<Arc<dyn AccountsApi>>,
}

#[async_trait]
impl Module for Pages {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let accounts = ctx.client_hub().get::<dyn AccountsApi>()?;
        self.accounts.store(Some(Arc::new(accounts)));

        let loaded = ctx.templates().add_embedded::<PageTemplates>()?;
        debug!(loaded, "Page templates registered");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl RestfulModule for Pages {
    fn register_rest(&self, ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering site pages");
        let accounts = self
            .accounts
            .load_full()
            .map(|api| Arc::clone(&*api))
            .ok_or_else(|| anyhow::anyhow!("Accounts client not resolved"))?;
        routes::register_routes(router, &ctx.urls(), accounts)
    }
}
