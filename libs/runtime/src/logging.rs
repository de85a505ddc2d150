//! Logging bootstrap.
//!
//! Every key of the `logging` map other than `default` names a subsystem: a
//! target prefix such as `company_store` or `store_db`. Records whose target
//! falls under a subsystem use that subsystem's levels and log file; all other
//! records fall through to the `default` section. Console output is human
//! readable, file output is JSON with size-based rotation.

use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use tracing::{level_filters::LevelFilter, Level, Metadata};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use crate::config::{LogSection, LoggingConfig};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

/// `None` means the sink is switched off. Unknown names fall back to `info`.
fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => None,
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => Some(Level::INFO),
    }
}

/// `target` is `prefix` itself or lives under `prefix::`.
fn under_prefix(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

type SharedFile = Arc<Mutex<FileRotate<AppendTimestamp>>>;

/// Write half handed to the formatter for a single record.
struct FileSink(Option<SharedFile>);

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.0.as_ref().map(|f| f.lock()) {
            Some(Ok(mut file)) => file.write(buf),
            // no file, or poisoned by a panicking writer: drop the record
            _ => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.0.as_ref().map(|f| f.lock()) {
            Some(Ok(mut file)) => file.flush(),
            _ => Ok(()),
        }
    }
}

/// Picks the log file for a record by its target.
#[derive(Clone, Default)]
struct FileRouter {
    fallback: Option<SharedFile>,
    subsystems: Vec<(String, SharedFile)>,
}

impl FileRouter {
    fn file_for(&self, target: &str) -> Option<SharedFile> {
        self.subsystems
            .iter()
            .find(|(prefix, _)| under_prefix(target, prefix))
            .map(|(_, f)| f.clone())
            .or_else(|| self.fallback.clone())
    }

    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.subsystems.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRouter {
    type Writer = FileSink;

    fn make_writer(&'a self) -> Self::Writer {
        FileSink(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        FileSink(self.file_for(meta.target()))
    }
}

fn log_path(file: &str, home_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home_dir.join(p)
    }
}

fn open_rotating(path: &Path, max_bytes: usize, max_backups: usize) -> std::io::Result<SharedFile> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_backups)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Arc::new(Mutex::new(file)))
}

/// Opens the section's log file. An empty `file` or an open failure yields `None`.
fn open_section_file(name: &str, section: &LogSection, home_dir: &Path) -> Option<SharedFile> {
    if section.file.trim().is_empty() {
        return None;
    }
    let path = log_path(&section.file, home_dir);
    let max_mb = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB);
    let max_backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);

    match open_rotating(&path, (max_mb * 1024 * 1024) as usize, max_backups) {
        Ok(file) => Some(file),
        Err(e) => {
            // no subscriber yet, so stderr it is
            eprintln!("cannot open log file for '{name}' at {}: {e}", path.display());
            None
        }
    }
}

/// Logging config resolved against the home directory.
struct Plan {
    subsystems: Vec<String>,
    console: Targets,
    file: Targets,
    default_console: Option<Level>,
    default_file: Option<Level>,
    files: FileRouter,
}

impl Plan {
    fn build(cfg: &LoggingConfig, home_dir: &Path) -> Self {
        let mut plan = Plan {
            subsystems: Vec::new(),
            console: Targets::new().with_default(LevelFilter::OFF),
            file: Targets::new().with_default(LevelFilter::OFF),
            default_console: None,
            default_file: None,
            files: FileRouter::default(),
        };

        for (name, section) in cfg {
            if name == DEFAULT_SECTION {
                plan.default_console = parse_level(&section.console_level);
                plan.files.fallback = open_section_file(name, section, home_dir);
                if plan.files.fallback.is_some() {
                    plan.default_file = parse_level(&section.file_level);
                }
                continue;
            }

            plan.subsystems.push(name.clone());
            if let Some(level) = parse_level(&section.console_level) {
                plan.console = plan.console.with_target(name.clone(), level);
            }
            if let Some(file) = open_section_file(name, section, home_dir) {
                plan.files.subsystems.push((name.clone(), file));
                if let Some(level) = parse_level(&section.file_level) {
                    plan.file = plan.file.with_target(name.clone(), level);
                }
            }
        }
        plan
    }

    /// Accepts records at or below `max` that no subsystem claims.
    fn unclaimed(&self, max: Level) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
        let subsystems = self.subsystems.clone();
        FilterFn::new(move |meta: &Metadata<'_>| {
            *meta.level() <= max && !subsystems.iter().any(|s| under_prefix(meta.target(), s))
        })
    }
}

/// Installs the global subscriber. Relative log file paths are resolved
/// against `home_dir`. Calling this twice is harmless; the first wins.
pub fn init_logging_from_config(cfg: &LoggingConfig, home_dir: &Path) {
    // `log` records from sqlx and friends flow into tracing
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = tracing_subscriber::fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let plan = Plan::build(cfg, home_dir);
    let ansi = std::io::stdout().is_terminal();
    let console = || {
        fmt::layer()
            .with_ansi(ansi)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };
    let json = |files: FileRouter| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(files)
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(console().with_filter(plan.console.clone()).boxed());
    if let Some(level) = plan.default_console {
        layers.push(console().with_filter(plan.unclaimed(level)).boxed());
    }
    if !plan.files.is_empty() {
        layers.push(json(plan.files.clone()).with_filter(plan.file.clone()).boxed());
        if let Some(level) = plan.default_file {
            layers.push(json(plan.files.clone()).with_filter(plan.unclaimed(level)).boxed());
        }
    }

    let _ = Registry::default().with(layers).try_init();
}
