use crate::context::ModuleCtx;
use crate::contracts::{Module, StatefulModule};
use crate::registry::ModuleRegistry;
use crate::runtime::{run, DbOptions, RunOptions, ShutdownOptions};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Worker {
    events: Mutex<Vec<&'static str>>,
}

#[async_trait::async_trait]
impl Module for Worker {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        assert!(ctx.db().is_none());
        self.events.lock().push("init");
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait::async_trait]
impl StatefulModule for Worker {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.events.lock().push("start");
        Ok(())
    }
    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.events.lock().push("stop");
        Ok(())
    }
}

struct NoConfig;

impl crate::context::ConfigProvider for NoConfig {
    fn get_module_config(&self, _module_name: &str) -> Option<&serde_json::Value> {
        None
    }
}

fn registry_with(worker: Arc<Worker>) -> ModuleRegistry {
    let mut b = ModuleRegistry::builder();
    b.register_core_with_meta("worker", &[], worker.clone());
    b.register_stateful_with_meta("worker", worker);
    b.build_topo_sorted().unwrap()
}

#[tokio::test]
async fn run_stops_when_token_is_cancelled() {
    let worker = Arc::new(Worker::default());
    let token = CancellationToken::new();

    let handle = tokio::spawn(run(RunOptions {
        registry: registry_with(worker.clone()),
        modules_cfg: Arc::new(NoConfig),
        db: DbOptions::None,
        shutdown: ShutdownOptions::Token(token.clone()),
    }));

    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("runner should stop")
        .unwrap()
        .unwrap();
    assert_eq!(*worker.events.lock(), vec!["init", "start", "stop"]);
}

#[tokio::test]
async fn run_stops_when_future_completes() {
    let worker = Arc::new(Worker::default());

    run(RunOptions {
        registry: registry_with(worker.clone()),
        modules_cfg: Arc::new(NoConfig),
        db: DbOptions::None,
        shutdown: ShutdownOptions::Future(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
        })),
    })
    .await
    .unwrap();

    assert_eq!(worker.events.lock().last(), Some(&"stop"));
}

#[test]
fn app_config_provides_module_sections() {
    use crate::context::ConfigProvider;

    let mut cfg = runtime::AppConfig::default();
    cfg.modules = HashMap::from([("books".to_string(), serde_json::json!({ "x": 1 }))]);
    assert_eq!(cfg.get_module_config("books").unwrap()["x"], 1);
    assert!(cfg.get_module_config("accounts").is_none());
}
