mod cli_parse;
mod manage;
mod monitor;

use std::{fs::File, io, process::ExitCode, time::Duration};

use cli_parse::{CliArgs, CliError, Mode};
use manage::{DaemonSchedule, RunError};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("cannot open daemon log {path:?}: {source}")]
    DaemonLog {
        path: std::path::PathBuf,
        source: io::Error,
    },
}

/// Log level used when `RUST_LOG` is unset.
fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr; stdout carries the greeting and the reports.
fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(args: &CliArgs) -> Result<(), AppError> {
    let directory = args.target_directory()?;
    tracing::debug!(directory = %directory.display(), mode = ?args.mode(), "starting");

    match args.mode() {
        Mode::Interactive => {
            manage::run_interactive(&directory, &mut io::stdout().lock(), &mut io::stdin().lock())?
        }
        Mode::Daemon => {
            let log_path = directory.join(manage::DAEMON_LOG);
            let mut log = File::create(&log_path).map_err(|source| AppError::DaemonLog {
                path: log_path.clone(),
                source,
            })?;
            println!("Started daemon, reporting to {}", log_path.display());

            let schedule = DaemonSchedule::forever(Duration::from_secs(args.interval));
            manage::run_daemon(&directory, &mut log, schedule)?;
        }
        Mode::Remove => {
            let removed = manage::remove_management(&directory)?;
            tracing::info!(count = removed.len(), "management removed");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match cli_parse::parse_args() {
        Ok(args) => args,
        Err(CliError::Clap(e)) => e.exit(),
        Err(e) => {
            eprintln!("estou-a-ver: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("estou-a-ver: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_level(0), "warn");
        assert_eq!(default_level(1), "info");
        assert_eq!(default_level(2), "debug");
        assert_eq!(default_level(3), "trace");
        assert_eq!(default_level(u8::MAX), "trace");
    }

    #[test]
    fn remove_mode_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(monitor::DATABASE_NAME), b"db").unwrap();

        let args = cli_parse::parse_args_from([
            std::ffi::OsString::from("estou-a-ver"),
            "--remove".into(),
            "--dir".into(),
            dir.path().as_os_str().to_owned(),
        ])
        .unwrap();
        run(&args).unwrap();

        assert!(!dir.path().join(monitor::DATABASE_NAME).exists());
    }
}
