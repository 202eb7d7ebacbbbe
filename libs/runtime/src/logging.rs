use crate::config::{LoggingConfig, Section};
use crate::paths::resolve_under;
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::FilterFn, fmt, prelude::*, Registry};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";

fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" | "" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// `target == name` or `target` starts with `name::`.
fn matches_prefix(target: &str, name: &str) -> bool {
    target
        .strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Per-target level lookup: the first matching subsystem wins, then "default".
#[derive(Clone, Debug)]
struct LevelMap {
    default: LevelFilter,
    by_prefix: Vec<(String, LevelFilter)>,
}

impl LevelMap {
    fn build(cfg: &LoggingConfig, pick: impl Fn(&Section) -> LevelFilter) -> Self {
        let default = cfg
            .get(DEFAULT_SECTION)
            .map(&pick)
            .unwrap_or(LevelFilter::OFF);
        let mut by_prefix: Vec<(String, LevelFilter)> = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .map(|(name, section)| (name.clone(), pick(section)))
            .collect();
        // Longest prefix first so "accounts::api" beats "accounts".
        by_prefix.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { default, by_prefix }
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        self.by_prefix
            .iter()
            .find(|(name, _)| matches_prefix(target, name))
            .map(|(_, level)| *level)
            .unwrap_or(self.default)
    }

    fn enabled(&self, meta: &tracing::Metadata<'_>) -> bool {
        self.level_for(meta.target()) >= *meta.level()
    }
}

// -------- rotating file writers --------

type SharedRotate = Arc<Mutex<FileRotate<AppendTimestamp>>>;

#[derive(Clone)]
struct RotWriter(SharedRotate);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file writer poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log file writer poisoned"))?
            .flush()
    }
}

/// Writes a record to its subsystem's file, falling back to the default file.
/// Records with no destination are dropped.
#[derive(Clone)]
struct RoutedWriter(Option<RotWriter>);

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(w) => w.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

struct FileRouter {
    default: Option<SharedRotate>,
    by_prefix: HashMap<String, SharedRotate>,
}

impl FileRouter {
    fn build(cfg: &LoggingConfig, base_dir: &Path) -> Self {
        let mut router = Self {
            default: None,
            by_prefix: HashMap::new(),
        };
        for (name, section) in cfg {
            let Some(writer) = open_section_file(name, section, base_dir) else {
                continue;
            };
            if name == DEFAULT_SECTION {
                router.default = Some(writer);
            } else {
                router.by_prefix.insert(name.clone(), writer);
            }
        }
        router
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }

    fn resolve(&self, target: &str) -> Option<RotWriter> {
        self.by_prefix
            .iter()
            .find(|(name, _)| matches_prefix(target, name))
            .map(|(_, w)| w)
            .or(self.default.as_ref())
            .map(|w| RotWriter(w.clone()))
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter(self.default.as_ref().map(|w| RotWriter(w.clone())))
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        RoutedWriter(self.resolve(meta.target()))
    }
}

fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<SharedRotate> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = resolve_under(&section.file, base_dir);
    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    let backups = section.max_backups.unwrap_or(3);

    match open_rotating_file(&path, max_bytes as usize, backups) {
        Ok(w) => Some(w),
        Err(e) => {
            // The subscriber is not installed yet, so stderr is the only channel.
            eprintln!(
                "Failed to open log file for '{}': {} ({})",
                name,
                path.display(),
                e
            );
            None
        }
    }
}

fn open_rotating_file(path: &Path, max_bytes: usize, backups: usize) -> std::io::Result<SharedRotate> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(backups)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Arc::new(Mutex::new(rot)))
}

// -------- public init --------

/// Install the global tracing subscriber.
///
/// Console output is human-readable; file output is JSON. Relative log file
/// paths are resolved against `base_dir` (normally `server.home_dir`).
/// Calling this more than once is harmless: later calls are ignored.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` records (sqlx, sea-orm) into tracing first.
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let ansi = std::io::stdout().is_terminal();
    let console_levels = LevelMap::build(cfg, |s| parse_level(&s.console_level));
    let console_layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(FilterFn::new(move |meta: &tracing::Metadata<'_>| {
            console_levels.enabled(meta)
        }));

    let router = FileRouter::build(cfg, base_dir);
    if router.is_empty() {
        let _ = Registry::default().with(console_layer).try_init();
        return;
    }

    let file_levels = LevelMap::build(cfg, |s| {
        if s.file.trim().is_empty() {
            LevelFilter::OFF
        } else {
            parse_level(&s.file_level)
        }
    });
    let file_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(router)
        .with_filter(FilterFn::new(move |meta: &tracing::Metadata<'_>| {
            file_levels.enabled(meta)
        }));

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
