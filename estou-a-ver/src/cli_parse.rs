use clap::{ArgAction, Parser};
use std::{ffi::OsString, io, path::PathBuf};
use thiserror::Error;

/// Seconds between two daemon cycles when `--interval` is not given.
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// What the program does once the arguments are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Greets once and exits.
    Interactive,
    /// Greets every interval until the process is stopped.
    Daemon,
    /// Deletes management artifacts from the directory.
    Remove,
}

/// The command line argument structure for the directory management utility.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Directory management command-line utility.",
    after_help = "
    EXAMPLES:
    # 1. Run once in the current directory
    estou-a-ver

    # 2. Run periodically on another directory, every minute
    estou-a-ver --dir ~/notes --daemon --interval 60

    # 3. Remove management from a directory
    estou-a-ver -D ~/notes -r
"
)]
pub struct CliArgs {
    /// Specifies which directory to operate on (default: current directory).
    #[arg(short = 'D', long = "directory", visible_alias = "dir", value_name = "PATH")]
    pub directory: Option<PathBuf>,
    /// Starts management as a periodic foreground process.
    #[arg(short, long)]
    pub daemon: bool,
    /// Removes management from the specified directory. Wins over --daemon.
    #[arg(short, long)]
    pub remove: bool,
    /// Seconds to wait between two daemon cycles.
    #[arg(short, long, value_name = "SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: u64,
    /// Raises log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CliArgs {
    /// Validates the arguments after parsing:
    /// 1. The target directory exists and is a directory.
    /// 2. The daemon interval is not zero.
    pub fn validate(&self) -> Result<(), CliError> {
        let directory = self.target_directory()?;
        if !directory.exists() {
            return Err(CliError::DirectoryNotFound(directory));
        }
        if !directory.is_dir() {
            return Err(CliError::NotADirectory(directory));
        }

        if self.interval == 0 {
            return Err(CliError::ZeroInterval);
        }

        Ok(())
    }

    /// The directory given on the command line, or the working directory.
    pub fn target_directory(&self) -> Result<PathBuf, CliError> {
        match &self.directory {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir().map_err(CliError::CurrentDir),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.remove {
            Mode::Remove
        } else if self.daemon {
            Mode::Daemon
        } else {
            Mode::Interactive
        }
    }
}

/// Errors raised while parsing or validating the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("directory {0:?} does not exist")]
    DirectoryNotFound(PathBuf),
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("--interval must be at least one second")]
    ZeroInterval,
    #[error("cannot read the current directory: {0}")]
    CurrentDir(#[source] io::Error),
    /// An error from clap itself, including the --help and --version displays.
    #[error(transparent)]
    Clap(#[from] clap::Error),
}

/// Parses and validates an explicit argument list. The first item is the program name.
pub fn parse_args_from<I, T>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = CliArgs::try_parse_from(args)?;
    args.validate()?;
    Ok(args)
}

/// Parses and validates the process arguments.
pub fn parse_args() -> Result<CliArgs, CliError> {
    parse_args_from(std::env::args_os())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(dir: &tempfile::TempDir, extra: &[&str]) -> Result<CliArgs, CliError> {
        let mut args = vec![
            OsString::from("estou-a-ver"),
            OsString::from("--dir"),
            dir.path().as_os_str().to_owned(),
        ];
        args.extend(extra.iter().map(OsString::from));
        parse_args_from(args)
    }

    #[test]
    fn defaults_to_interactive_mode() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&dir, &[]).unwrap();
        assert_eq!(args.mode(), Mode::Interactive);
        assert_eq!(args.interval, DEFAULT_INTERVAL_SECS);
        assert_eq!(args.verbose, 0);
        assert_eq!(args.target_directory().unwrap(), dir.path());
    }

    #[test]
    fn daemon_flag_and_interval() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&dir, &["-d", "--interval", "7", "-vv"]).unwrap();
        assert_eq!(args.mode(), Mode::Daemon);
        assert_eq!(args.interval, 7);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn remove_wins_over_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&dir, &["--daemon", "--remove"]).unwrap();
        assert_eq!(args.mode(), Mode::Remove);
    }

    #[test]
    fn long_and_short_directory_spellings() {
        let dir = tempfile::tempdir().unwrap();
        for flag in ["-D", "--dir", "--directory"] {
            let args = parse_args_from([
                OsString::from("estou-a-ver"),
                OsString::from(flag),
                dir.path().as_os_str().to_owned(),
            ])
            .unwrap();
            assert_eq!(args.directory.as_deref(), Some(dir.path()));
        }
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = parse_args_from([
            OsString::from("estou-a-ver"),
            OsString::from("--dir"),
            missing.clone().into_os_string(),
        ])
        .unwrap_err();
        assert!(matches!(err, CliError::DirectoryNotFound(path) if path == missing));
    }

    #[test]
    fn file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = parse_args_from([
            OsString::from("estou-a-ver"),
            OsString::from("-D"),
            file.clone().into_os_string(),
        ])
        .unwrap_err();
        assert!(matches!(err, CliError::NotADirectory(path) if path == file));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse(&dir, &["-d", "-i", "0"]).unwrap_err();
        assert!(matches!(err, CliError::ZeroInterval));
    }

    #[test]
    fn unknown_flag_is_a_clap_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse(&dir, &["--bogus"]).unwrap_err();
        match err {
            CliError::Clap(e) => assert_eq!(e.kind(), ErrorKind::UnknownArgument),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
