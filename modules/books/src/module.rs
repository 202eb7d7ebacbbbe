use std::sync::Arc;

use accounts::AccountsApi;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use modkit::{DbModule, Module, ModuleCtx, RegistryBuilder, RestfulModule};
use rust_embed::RustEmbed;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::BooksConfig;
use crate::contract::client::BooksApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::BooksLocalClient;
use crate::infra::accounts_directory::AccountsDirectory;
use crate::infra::storage::sea_orm_repo::{SeaOrmBooksRepository, SeaOrmReviewsRepository};

pub const MODULE_NAME: &str = "books";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct BooksTemplates;

/// Register the module with all of its capabilities.
pub fn register(b: &mut RegistryBuilder) {
    let m = Arc::new(Books::default());
    b.register_core_with_meta(MODULE_NAME, &[accounts::MODULE_NAME], m.clone());
    b.register_db_with_meta(MODULE_NAME, m.clone());
    b.register_rest_with_meta(MODULE_NAME, m);
}

/// Book catalog, reviews and their pages.
#[derive(Default)]
pub struct Books {
    service: ArcSwapOption<Service>,
    accounts: ArcSwapOption<Arc<dyn AccountsApi>>,
}

impl Books {
    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    fn accounts(&self) -> anyhow::Result<Arc<dyn AccountsApi>> {
        self.accounts
            .load_full()
            .map(|api| Arc::clone(&*api))
            .ok_or_else(|| anyhow::anyhow!("Accounts client not resolved"))
    }
}

#[async_trait]
impl Module for Books {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing books module");

        let cfg: BooksConfig = ctx.module_config();
        debug!(max_review_length = cfg.max_review_length, "Loaded books config");

        let accounts = ctx.client_hub().get::<dyn AccountsApi>()?;

        let db = ctx.db_required()?;
        let books = SeaOrmBooksRepository::new(db.sea());
        let reviews = SeaOrmReviewsRepository::new(db.sea());
        let service = Arc::new(Service::new(
            Arc::new(books),
            Arc::new(reviews),
            Arc::new(AccountsDirectory::new(accounts.clone())),
            ServiceConfig {
                max_review_length: cfg.max_review_length,
            },
        ));
        self.service.store(Some(service.clone()));
        self.accounts.store(Some(Arc::new(accounts)));

        let api: Arc<dyn BooksApi> = Arc::new(BooksLocalClient::new(service));
        ctx.client_hub().register::<dyn BooksApi>(api);
        info!("Books API exposed to ClientHub");

        let loaded = ctx.templates().add_embedded::<BooksTemplates>()?;
        debug!(loaded, "Books templates registered");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Books {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running books database migrations");
        crate::infra::storage::migrations::Migrator::up(db.seaorm(), None).await?;
        info!("Books database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Books {
    fn register_rest(&self, ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering books routes");
        routes::register_routes(router, &ctx.urls(), self.service()?, self.accounts()?)
    }
}
