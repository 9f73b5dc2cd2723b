use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use shared_files::greeter;
use thiserror::Error;

use crate::monitor::{self, MonitorError, Outcome};

/// Daemon report file, written inside the managed directory.
pub const DAEMON_LOG: &str = ".daemon.log";

/// Files management leaves behind in a managed directory.
pub const ARTIFACTS: [&str; 3] = [DAEMON_LOG, monitor::DATABASE_NAME, monitor::DATABASE_BACKUP];

const MONITORING_STARTED: &str = "Directory is now being monitored";
const INTEGRITY_COMPROMISED: &str = "Database integrity compromised";
const RECOVER_PROMPT: &str = "Do you wish to recover the last backup? [Y/n] ";

/// Errors raised while running one of the management modes.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to write greeting: {0}")]
    Greeting(#[source] io::Error),
    #[error("failed to write report: {0}")]
    Report(#[source] io::Error),
    #[error("failed to read answer: {0}")]
    Prompt(#[source] io::Error),
    #[error(transparent)]
    Monitor(#[from] MonitorError),
    #[error("failed to remove {path:?}: {source}")]
    Remove { path: PathBuf, source: io::Error },
}

/// How often the daemon loop runs, and for how long.
#[derive(Debug, Clone, Copy)]
pub struct DaemonSchedule {
    pub interval: Duration,
    /// `None` runs until the process is stopped.
    pub max_cycles: Option<u64>,
}

impl DaemonSchedule {
    pub fn forever(interval: Duration) -> Self {
        DaemonSchedule {
            interval,
            max_cycles: None,
        }
    }
}

fn report<W: Write + ?Sized>(out: &mut W, line: impl std::fmt::Display) -> Result<(), RunError> {
    writeln!(out, "{line}").map_err(RunError::Report)
}

/// Writes what one monitoring pass found.
fn report_outcome<W: Write + ?Sized>(out: &mut W, outcome: &Outcome) -> Result<(), RunError> {
    match outcome {
        Outcome::Created { .. } => report(out, MONITORING_STARTED),
        Outcome::Checked { changes } => {
            for change in changes {
                report(out, change)?;
            }
            Ok(())
        }
    }
}

/// Greets, then runs one monitoring pass over `directory` and reports on `out`.
///
/// A damaged database is reported instead of failing. When a backup exists the
/// user is asked on `input` whether to restore it; anything but `n` restores.
pub fn run_interactive<W, R>(directory: &Path, out: &mut W, input: &mut R) -> Result<(), RunError>
where
    W: Write + ?Sized,
    R: BufRead + ?Sized,
{
    greeter::write_greeting(out).map_err(RunError::Greeting)?;

    match monitor::check_directory(directory) {
        Ok(outcome) => report_outcome(out, &outcome),
        Err(MonitorError::Corrupt { line }) => {
            tracing::warn!(line, "database could not be parsed");
            report(out, INTEGRITY_COMPROMISED)?;
            if !monitor::has_backup(directory) {
                return Ok(());
            }

            write!(out, "{RECOVER_PROMPT}").map_err(RunError::Report)?;
            out.flush().map_err(RunError::Report)?;
            let mut answer = String::new();
            input.read_line(&mut answer).map_err(RunError::Prompt)?;

            if !answer.trim().eq_ignore_ascii_case("n") {
                monitor::restore_backup(directory)?;
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs one monitoring pass over `directory` per cycle, reporting on `log`,
/// and sleeps `schedule.interval` between cycles.
///
/// A damaged database is reported and the loop keeps going. Returns the number
/// of completed cycles once `max_cycles` is reached. There is no sleep after
/// the final bounded cycle.
pub fn run_daemon<W: Write + ?Sized>(
    directory: &Path,
    log: &mut W,
    schedule: DaemonSchedule,
) -> Result<u64, RunError> {
    tracing::info!(
        directory = %directory.display(),
        interval_secs = schedule.interval.as_secs(),
        "starting periodic management"
    );

    let mut cycles: u64 = 0;
    loop {
        match monitor::check_directory(directory) {
            Ok(outcome) => report_outcome(log, &outcome)?,
            Err(MonitorError::Corrupt { line }) => {
                tracing::warn!(line, "database could not be parsed");
                report(log, INTEGRITY_COMPROMISED)?;
            }
            Err(e) => return Err(e.into()),
        }
        log.flush().map_err(RunError::Report)?;
        cycles += 1;
        tracing::debug!(cycle = cycles, "cycle complete");

        if schedule.max_cycles.is_some_and(|max| cycles >= max) {
            return Ok(cycles);
        }
        thread::sleep(schedule.interval);
    }
}

/// Deletes every artifact in [`ARTIFACTS`] found in `directory`.
///
/// Missing artifacts are skipped and no other file is touched. Returns the
/// removed paths in [`ARTIFACTS`] order.
pub fn remove_management(directory: &Path) -> Result<Vec<PathBuf>, RunError> {
    let mut removed = Vec::new();

    for name in ARTIFACTS {
        let path = directory.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed");
                removed.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => return Err(RunError::Remove { path, source }),
        }
    }

    if removed.is_empty() {
        tracing::info!(directory = %directory.display(), "directory was not managed");
    }
    Ok(removed)
}
