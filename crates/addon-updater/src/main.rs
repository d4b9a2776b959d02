//! `addon-updater` - keep an installed add-on in sync with its published source
//!
//! Usage:
//!   `addon-updater run`       poll on the configured interval until Ctrl-C
//!   `addon-updater check`     run a single check
//!   `addon-updater update`    check and install a newer version now
//!   `addon-updater interval`  print the configured delay between checks

mod logging;
mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use addon_updater_core::{
    CommandHost, FIRST_CHECK_DELAY, StatusMessage, UpdateChecker, Version, redact_url,
    run_periodic,
};
use addon_updater_platform::AppPaths;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use crate::settings::{AppSettings, SettingsError};

#[derive(Parser)]
#[command(name = "addon-updater")]
#[command(author, version, about = "Self-update checker for an installed add-on")]
#[command(propagate_version = true)]
struct Cli {
    /// Directory to keep settings and logs in instead of the platform default
    #[arg(long, env = "ADDON_UPDATER_HOME", global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Check periodically until interrupted
    Run,
    /// Check once and report the result
    Check,
    /// Check once and install a newer version even if auto-update is off
    Update,
    /// Print the delay between periodic checks, in seconds
    Interval,
}

type Checker = UpdateChecker<CommandHost>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let paths = match cli.home {
        Some(home) => AppPaths::rooted_at(home),
        None => match AppPaths::new() {
            Ok(paths) => paths,
            Err(error) => {
                eprintln!("addon-updater: {error}");
                return ExitCode::FAILURE;
            }
        },
    };
    let settings_path = paths.settings_file();
    let settings = AppSettings::load(&settings_path);
    logging::init_logging(&paths, settings.debug_logging, settings.max_log_size_bytes);

    let command = cli.command.unwrap_or(Commands::Run);
    if let Commands::Interval = command {
        println!("{}", settings.preferences.check_interval.as_secs());
        return ExitCode::SUCCESS;
    }

    let mut checker = match build_checker(&settings) {
        Ok(checker) => checker,
        Err(error) => {
            error!("Cannot start update checker: {error}");
            eprintln!("addon-updater: {error} (edit {})", settings_path.display());
            return ExitCode::FAILURE;
        }
    };

    match command {
        Commands::Run => {
            run(&mut checker, &settings_path).await;
            ExitCode::SUCCESS
        }
        Commands::Check => {
            let status = checker.run_check().await;
            finish_one_shot(&checker, &settings_path, &status)
        }
        Commands::Update => {
            let status = install_now(&mut checker).await;
            finish_one_shot(&checker, &settings_path, &status)
        }
        Commands::Interval => ExitCode::SUCCESS,
    }
}

fn build_checker(settings: &AppSettings) -> Result<Checker, BuildError> {
    let endpoints = settings.endpoints()?;
    let current_version = settings.current_version()?;

    let mut builder = reqwest::Client::builder();
    if let Some(secs) = settings.http_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().map_err(BuildError::HttpClient)?;

    info!(
        "Watching {} for updates to {current_version}",
        redact_url(&endpoints.version_url)
    );

    let host = CommandHost::new(settings.addon_path.clone(), settings.reload_command.clone());
    Ok(UpdateChecker::new(
        client,
        endpoints,
        current_version,
        settings.preferences,
        host,
    ))
}

#[derive(Debug, thiserror::Error)]
enum BuildError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

async fn run(checker: &mut Checker, settings_path: &Path) {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping update checks");
        }
        on_signal.cancel();
    });

    info!(
        "Checking for updates {}",
        checker.preferences().check_interval.label().to_lowercase()
    );
    run_periodic(checker, FIRST_CHECK_DELAY, cancel, |checker, status| {
        println!("{status}");
        sync_settings(checker, settings_path);
    })
    .await;
}

/// Check once, then install a pending update unless the check already tried.
async fn install_now(checker: &mut Checker) -> StatusMessage {
    let status = checker.run_check().await;
    if checker.update_available() && !checker.preferences().auto_update {
        checker.manual_update().await
    } else {
        status
    }
}

fn finish_one_shot(checker: &Checker, settings_path: &Path, status: &StatusMessage) -> ExitCode {
    println!("{status}");
    persist_installed_version(checker, settings_path);
    if status.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Pick up preference edits made while running and record the installed
/// version. Edits apply from the next check.
fn sync_settings(checker: &mut Checker, path: &Path) {
    let settings = match AppSettings::try_load(path) {
        Ok(settings) => settings,
        Err(error) => {
            warn!("Keeping current preferences: {error}");
            return;
        }
    };
    if settings.preferences != checker.preferences() {
        info!(
            "Preferences changed: auto_update={}, interval={}",
            settings.preferences.auto_update, settings.preferences.check_interval
        );
        checker.set_preferences(settings.preferences);
    }
    record_installed_version(settings, checker.current_version(), path);
}

/// Record a freshly installed version so the next start compares against it.
fn persist_installed_version(checker: &Checker, path: &Path) {
    match AppSettings::try_load(path) {
        Ok(settings) => record_installed_version(settings, checker.current_version(), path),
        Err(error) => error!(
            "Not recording installed version {}: {error}",
            checker.current_version()
        ),
    }
}

fn record_installed_version(mut settings: AppSettings, installed: Version, path: &Path) {
    if settings.current_version == Some(installed) {
        return;
    }
    settings.current_version = Some(installed);
    if let Err(error) = settings.save(path) {
        error!("Failed to record installed version {installed}: {error}");
    }
}
