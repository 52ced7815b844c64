use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "chatrelay.log";
pub const MAX_LOG_BYTES: u64 = 5 * 1024 * 1024;
pub const LOG_BACKUPS: usize = 3;

const NOISY_TARGETS: &[&str] = &["reqwest", "hyper", "hyper_util", "teloxide"];

/// Console at INFO, `{log_dir}/chatrelay.log` at DEBUG. `RUST_LOG` overrides
/// both levels when set.
pub fn init_logging(log_dir: &Path) -> Result<()> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let writer = RotatingLogWriter::new(log_dir.join(LOG_FILE_NAME), MAX_LOG_BYTES, LOG_BACKUPS)?;

    let console = tracing_subscriber::fmt::layer().with_filter(level_filter("info"));
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(level_filter("debug"));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

pub fn init_console_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level_filter("info"))
        .try_init();
}

fn level_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(default_level)))
}

fn default_directives(level: &str) -> String {
    let mut directives = level.to_string();
    for target in NOISY_TARGETS {
        directives.push_str(&format!(",{target}=warn"));
    }
    directives
}

#[derive(Debug)]
struct RotatingState {
    file: File,
    written: u64,
}

#[derive(Clone, Debug)]
struct RotatingLogWriter {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Arc<Mutex<RotatingState>>,
}

impl RotatingLogWriter {
    fn new(path: PathBuf, max_bytes: u64, backups: usize) -> Result<Self> {
        let file = open_log_file(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path,
            max_bytes,
            backups,
            state: Arc::new(Mutex::new(RotatingState { file, written })),
        })
    }
}

impl<'a> MakeWriter<'a> for RotatingLogWriter {
    type Writer = RotatingLogGuard;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingLogGuard {
            path: self.path.clone(),
            max_bytes: self.max_bytes,
            backups: self.backups,
            state: self.state.clone(),
        }
    }
}

struct RotatingLogGuard {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Arc<Mutex<RotatingState>>,
}

impl Write for RotatingLogGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("failed to lock log writer"))?;

        if state.written > 0 && state.written + buf.len() as u64 > self.max_bytes {
            state.file.flush()?;
            rotate_backups(&self.path, self.backups)?;
            state.file = open_log_file(&self.path)?;
            state.written = 0;
        }

        let n = state.file.write(buf)?;
        state.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("failed to lock log writer"))?;
        state.file.flush()
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

/// Shift `log.1 -> log.2 -> ...`, dropping the oldest, then move the live
/// file to `log.1`. With zero backups the live file is simply truncated.
fn rotate_backups(path: &Path, backups: usize) -> io::Result<()> {
    if backups == 0 {
        return fs::remove_file(path).or_else(ignore_not_found);
    }
    fs::remove_file(backup_path(path, backups)).or_else(ignore_not_found)?;
    for index in (1..backups).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            fs::rename(&from, backup_path(path, index + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1)).or_else(ignore_not_found)
}

fn ignore_not_found(err: io::Error) -> io::Result<()> {
    if err.kind() == io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(err)
    }
}
