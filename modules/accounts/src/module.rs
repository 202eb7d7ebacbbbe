use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use async_trait::async_trait;
use modkit::{DbModule, Module, ModuleCtx, RegistryBuilder, RestfulModule};
use rust_embed::RustEmbed;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::rest::{handlers::AuthSettings, routes};
use crate::config::AccountsConfig;
use crate::contract::client::AccountsApi;
use crate::domain::password::PasswordPolicy;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::AccountsLocalClient;
use crate::infra::storage::sea_orm_repo::{SeaOrmSessionsRepository, SeaOrmUsersRepository};

pub const MODULE_NAME: &str = "accounts";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct AccountsTemplates;

/// Register the module with all of its capabilities.
pub fn register(b: &mut RegistryBuilder) {
    let m = Arc::new(Accounts::default());
    b.register_core_with_meta(MODULE_NAME, &[], m.clone());
    b.register_db_with_meta(MODULE_NAME, m.clone());
    b.register_rest_with_meta(MODULE_NAME, m);
}

/// User store, sessions and the registration/login pages.
#[derive(Default)]
pub struct Accounts {
    service: ArcSwapOption<Service>,
    config: ArcSwap<AccountsConfig>,
}

impl Accounts {
    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }
}

#[async_trait]
impl Module for Accounts {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        info!("Initializing accounts module");

        let cfg: AccountsConfig = ctx.module_config();
        debug!(
            min_password_length = cfg.min_password_length,
            session_ttl_hours = cfg.session_ttl_hours,
            "Loaded accounts config"
        );

        let db = ctx.db_required()?;
        let users = SeaOrmUsersRepository::new(db.sea());
        let sessions = SeaOrmSessionsRepository::new(db.sea());
        let service_config = ServiceConfig {
            password_policy: PasswordPolicy {
                min_length: cfg.min_password_length,
            },
            session_ttl: chrono::Duration::hours(i64::from(cfg.session_ttl_hours)),
        };
        let service = Arc::new(Service::new(
            Arc::new(users),
            Arc::new(sessions),
            service_config,
        ));
        self.service.store(Some(service.clone()));
        self.config.store(Arc::new(cfg));

        let api: Arc<dyn AccountsApi> = Arc::new(AccountsLocalClient::new(service));
        ctx.client_hub().register::<dyn AccountsApi>(api);
        info!("Accounts API exposed to ClientHub");

        let loaded = ctx.templates().add_embedded::<AccountsTemplates>()?;
        debug!(loaded, "Accounts templates registered");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Accounts {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("Running accounts database migrations");
        crate::infra::storage::migrations::Migrator::up(db.seaorm(), None).await?;
        info!("Accounts database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Accounts {
    fn register_rest(&self, ctx: &ModuleCtx, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering accounts routes");
        let cfg = self.config.load_full();
        let settings = Arc::new(AuthSettings {
            urls: ctx.urls(),
            login_redirect: cfg.login_redirect.clone(),
            logout_redirect: cfg.logout_redirect.clone(),
            secure_cookies: cfg.secure_cookies,
        });
        routes::register_routes(router, &ctx.urls(), self.service()?, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_embedded() {
        let names: Vec<String> = AccountsTemplates::iter().map(|n| n.to_string()).collect();
        assert!(names.contains(&"registration/signup.html".to_string()));
        assert!(names.contains(&"registration/login.html".to_string()));
    }

    #[test]
    fn rest_needs_init_first() {
        let m = Accounts::default();
        assert!(m.service().is_err());
    }
}
