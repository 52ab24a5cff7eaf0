//! Console and log-file output for the ssis-deploy CLI
//!
//! Messages always go to a log file that is truncated on every run. What
//! reaches the console depends on the verbosity set by [`init_with_verbosity`]:
//! 0 shows warnings, errors and results, 1 adds info/debug, 2 adds steps.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

const LOG_FILE_NAME: &str = "ssis-deploy.log";
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

struct Sink {
    file: Option<PathBuf>,
    verbosity: u8,
}

static SINK: Mutex<Sink> = Mutex::new(Sink {
    file: None,
    verbosity: 0,
});
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Error,
    Warn,
    Success,
    Info,
    Debug,
    Step,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Success => "SUCCESS",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Step => "STEP",
        }
    }

    /// Lowest verbosity at which the level reaches the console
    fn console_threshold(self) -> u8 {
        match self {
            Level::Error | Level::Warn | Level::Success => 0,
            Level::Info | Level::Debug => 1,
            Level::Step => 2,
        }
    }

    fn prefix(self) -> Option<ColoredString> {
        match self {
            Level::Error => Some("Error:".red().bold()),
            Level::Warn => Some("warning:".yellow().bold()),
            Level::Success => Some("\u{2714}".green().bold()),
            Level::Debug => Some("DEBUG:".blue().bold()),
            Level::Step => Some("TRACE:".dimmed()),
            Level::Info => None,
        }
    }
}

/// Get the current verbosity level
pub fn get_verbosity() -> u8 {
    SINK.lock().map(|sink| sink.verbosity).unwrap_or(0)
}

/// `tracing` filter directive matching the verbosity: warn, debug (-v) or trace (-vv)
pub fn verbosity_to_filter() -> &'static str {
    match get_verbosity() {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Set the verbosity and start a fresh log file.
///
/// The log file lives in `log_dir` when given, otherwise in the user config
/// directory.
pub fn init_with_verbosity(verbosity: u8, log_dir: Option<&Path>) -> Result<(), String> {
    let dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => get_config_dir()?,
    };
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create log directory: {}", e))?;

    let log_file = dir.join(LOG_FILE_NAME);
    fs::write(&log_file, "").map_err(|e| format!("Failed to truncate log file: {}", e))?;

    let mut sink = SINK.lock().map_err(|_| "Logger lock poisoned".to_string())?;
    sink.verbosity = verbosity;
    sink.file = Some(log_file);
    Ok(())
}

/// Directory holding the ssis-deploy config file and log
pub fn get_config_dir() -> Result<PathBuf, String> {
    #[cfg(not(target_os = "windows"))]
    let base = dirs::home_dir()
        .ok_or("Could not determine home directory")?
        .join(".config");

    #[cfg(target_os = "windows")]
    let base = dirs::config_dir().ok_or("Could not determine config directory")?;

    Ok(base.join("ssis-deploy"))
}

fn emit(level: Level, message: &str) {
    let verbosity = match SINK.lock() {
        Ok(sink) => {
            if let Some(path) = &sink.file {
                append_line(path, level, message);
            }
            sink.verbosity
        }
        Err(_) => 0,
    };

    if verbosity < level.console_threshold() {
        return;
    }
    match level.prefix() {
        Some(prefix) => eprintln!("{} {}", prefix, message),
        None => eprintln!("{}", message),
    }
}

fn append_line(path: &Path, level: Level, message: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(file, "[{}] {} {}", timestamp, level.tag(), message);
    }
}

pub fn info(message: &str) {
    emit(Level::Info, message);
}

pub fn debug(message: &str) {
    emit(Level::Debug, message);
}

pub fn warn(message: &str) {
    emit(Level::Warn, message);
}

pub fn error(message: &str) {
    emit(Level::Error, message);
}

/// Result line shown at every verbosity
pub fn success(message: &str) {
    emit(Level::Success, message);
}

/// Fine-grained progress, only on the console at -vv
pub fn step(message: &str) {
    emit(Level::Step, message);
}

/// Path of the current run's log file, once initialized
pub fn get_log_path() -> Option<PathBuf> {
    SINK.lock().ok().and_then(|sink| sink.file.clone())
}

pub fn show_log_path() {
    match get_log_path() {
        Some(path) => eprintln!("Log file: {}", path.display()),
        None => eprintln!("Log file location not available"),
    }
}

/// Show a spinner for long-running work. Verbose runs log the message instead.
pub fn spinner_start(message: &str) {
    if get_verbosity() > 0 {
        emit(Level::Info, message);
        return;
    }
    if let Ok(sink) = SINK.lock() {
        if let Some(path) = &sink.file {
            append_line(path, Level::Info, message);
        }
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(SPINNER_FRAMES)
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    if let Ok(mut current) = SPINNER.lock() {
        if let Some(previous) = current.replace(spinner) {
            previous.finish_and_clear();
        }
    }
}

fn spinner_clear() {
    if let Ok(mut current) = SPINNER.lock() {
        if let Some(spinner) = current.take() {
            spinner.finish_and_clear();
        }
    }
}

pub fn spinner_success(message: &str) {
    spinner_clear();
    success(message);
}

pub fn spinner_error(message: &str) {
    spinner_clear();
    emit(Level::Error, message);
}
