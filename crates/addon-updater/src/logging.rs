#[cfg(debug_assertions)]
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use simplelog::{CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use addon_updater_platform::AppPaths;

/// Log sink for the updater's file logger. Appends to `path` and opens it
/// again when the file disappears under a running updater.
struct LogFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogFile {
    fn open(path: PathBuf) -> io::Result<Self> {
        let file = append_to(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    fn current(&self) -> io::Result<MutexGuard<'_, File>> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            *file = append_to(&self.path)?;
        }
        Ok(file)
    }
}

fn append_to(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.current()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.current()?.flush()
    }
}

fn rotated_path(log_path: &Path) -> PathBuf {
    let mut name = log_path.as_os_str().to_owned();
    name.push(".old");
    PathBuf::from(name)
}

/// Move a log larger than `max_log_size` aside to `<log>.old`, replacing the
/// previous generation. Returns the rotated path when a rotation happened.
fn rotate_if_oversized(log_path: &Path, max_log_size: u64) -> io::Result<Option<PathBuf>> {
    let size = match std::fs::metadata(log_path) {
        Ok(metadata) => metadata.len(),
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };
    if size <= max_log_size {
        return Ok(None);
    }
    let rotated = rotated_path(log_path);
    std::fs::rename(log_path, &rotated)?;
    Ok(Some(rotated))
}

fn level_for(debug_enabled: bool) -> log::LevelFilter {
    if debug_enabled {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

pub fn init_logging(paths: &AppPaths, debug_enabled: bool, max_log_size: u64) {
    let _ = paths.ensure_dirs();
    let log_path = paths.log_file();
    let rotation = rotate_if_oversized(&log_path, max_log_size);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_allow_str("addon_updater")
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    #[cfg(debug_assertions)]
    loggers.push(TermLogger::new(
        LevelFilter::Debug,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    match LogFile::open(log_path.clone()) {
        Ok(sink) => loggers.push(WriteLogger::new(LevelFilter::Debug, config, sink)),
        Err(error) => eprintln!("Could not open log file {}: {error}", log_path.display()),
    }

    if !loggers.is_empty() {
        let _ = CombinedLogger::init(loggers);
    }

    set_debug_logging(debug_enabled);

    match rotation {
        Ok(Some(rotated)) => log::info!("Previous log moved to {}", rotated.display()),
        Ok(None) => {}
        Err(error) => log::warn!("Could not rotate {}: {error}", log_path.display()),
    }
    log::debug!("Logging initialized, log file: {}", log_path.display());
}

pub fn set_debug_logging(enabled: bool) {
    log::set_max_level(level_for(enabled));
}
