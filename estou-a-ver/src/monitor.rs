//! # Directory integrity monitor
//!
//! Keeps a SHA-256 digest of every visible regular file of a directory in a
//! database file inside that directory, and reports which files were added,
//! altered or deleted since the database was written.
//!
//! The database is plain text, one `<hex digest>  <file name>` line per file,
//! sorted by name. Hidden files (leading `.`) are never tracked, which keeps
//! the database, its backup and the daemon log out of their own report.

use std::{
    collections::BTreeMap,
    fmt,
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// File holding the digests of the last known good state.
pub const DATABASE_NAME: &str = ".database";
/// Copy of the database taken after a check that found no changes.
pub const DATABASE_BACKUP: &str = ".database_backup";

const BLOCK_SIZE: usize = 4096;
const DIGEST_HEX_LEN: usize = 64;

/// File name to lowercase hex SHA-256 digest.
pub type Database = BTreeMap<String, String>;

/// A difference between the database and the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(String),
    Altered(String),
    Deleted(String),
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added(name) => write!(f, "{} was added", name),
            Change::Altered(name) => write!(f, "{} was altered", name),
            Change::Deleted(name) => write!(f, "{} was deleted", name),
        }
    }
}

/// Result of one pass over a directory.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No database existed; one was written covering `files` files.
    Created { files: usize },
    /// The database was compared against the directory.
    Checked { changes: Vec<Change> },
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("database integrity compromised (line {line})")]
    Corrupt { line: usize },
}

impl MonitorError {
    fn io(path: &Path, source: io::Error) -> Self {
        MonitorError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Names of the visible regular files in `directory`, sorted.
///
/// Names that are not UTF-8 or contain a line break cannot be stored in the
/// database and are skipped with a warning.
pub fn list_files(directory: &Path) -> Result<Vec<String>, MonitorError> {
    let entries = fs::read_dir(directory).map_err(|e| MonitorError::io(directory, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MonitorError::io(directory, e))?;
        let path = entry.path();

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!(name = ?raw, "skipping file with a non UTF-8 name");
                continue;
            }
        };
        if name.starts_with('.') {
            continue;
        }
        if name.contains(['\n', '\r']) {
            tracing::warn!(name = ?name, "skipping file with a line break in its name");
            continue;
        }

        // Follows symlinks, so a link to a regular file is tracked.
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(name),
            Ok(_) => continue,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(MonitorError::io(&path, e)),
        }
    }

    files.sort();
    Ok(files)
}

/// Lowercase hex SHA-256 of the file at `path`, read in 4 KiB blocks.
pub fn hash_file(path: &Path) -> Result<String, MonitorError> {
    let mut file = File::open(path).map_err(|e| MonitorError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut block = [0u8; BLOCK_SIZE];

    loop {
        let read = match file.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(MonitorError::io(path, e)),
        };
        hasher.update(&block[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digests every file [`list_files`] returns.
pub fn build_database(directory: &Path) -> Result<Database, MonitorError> {
    list_files(directory)?
        .into_iter()
        .map(|name| {
            let digest = hash_file(&directory.join(&name))?;
            Ok((name, digest))
        })
        .collect()
}

pub fn encode_database(database: &Database) -> String {
    database
        .iter()
        .map(|(name, digest)| format!("{digest}  {name}\n"))
        .collect()
}

/// Parses the text written by [`encode_database`].
pub fn decode_database(text: &str) -> Result<Database, MonitorError> {
    let mut database = Database::new();

    for (index, line) in text.lines().enumerate() {
        let corrupt = MonitorError::Corrupt { line: index + 1 };
        let (digest, name) = line.split_once("  ").ok_or(corrupt)?;

        let valid_digest = digest.len() == DIGEST_HEX_LEN
            && digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid_digest || name.is_empty() {
            return Err(MonitorError::Corrupt { line: index + 1 });
        }
        database.insert(name.to_string(), digest.to_string());
    }

    Ok(database)
}

/// Reads the database of `directory`, `None` when the directory is not managed yet.
pub fn load_database(directory: &Path) -> Result<Option<Database>, MonitorError> {
    let path = directory.join(DATABASE_NAME);
    match fs::read_to_string(&path) {
        Ok(text) => decode_database(&text).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        // Non UTF-8 content is a damaged database, not an I/O failure.
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(MonitorError::Corrupt { line: 0 }),
        Err(e) => Err(MonitorError::io(&path, e)),
    }
}

pub fn save_database(directory: &Path, database: &Database) -> Result<(), MonitorError> {
    let path = directory.join(DATABASE_NAME);
    fs::write(&path, encode_database(database)).map_err(|e| MonitorError::io(&path, e))
}

/// Differences between `recorded` and `current`, ordered by file name.
pub fn compare(recorded: &Database, current: &Database) -> Vec<Change> {
    let mut changes: Vec<Change> = Vec::new();

    for (name, digest) in current {
        match recorded.get(name) {
            None => changes.push(Change::Added(name.clone())),
            Some(old) if old != digest => changes.push(Change::Altered(name.clone())),
            Some(_) => {}
        }
    }
    for name in recorded.keys() {
        if !current.contains_key(name) {
            changes.push(Change::Deleted(name.clone()));
        }
    }

    changes.sort_by(|a, b| change_name(a).cmp(change_name(b)));
    changes
}

fn change_name(change: &Change) -> &str {
    match change {
        Change::Added(name) | Change::Altered(name) | Change::Deleted(name) => name,
    }
}

/// One monitoring pass over `directory`.
///
/// Without a database, one is created from the current contents. Otherwise
/// the directory is compared against it. A pass that finds no change copies
/// the database to [`DATABASE_BACKUP`]. A pass that finds changes leaves
/// the database untouched, so they keep being reported.
pub fn check_directory(directory: &Path) -> Result<Outcome, MonitorError> {
    let current = build_database(directory)?;

    let Some(recorded) = load_database(directory)? else {
        save_database(directory, &current)?;
        tracing::info!(directory = %directory.display(), files = current.len(), "database created");
        return Ok(Outcome::Created {
            files: current.len(),
        });
    };

    let changes = compare(&recorded, &current);
    if changes.is_empty() {
        let from = directory.join(DATABASE_NAME);
        let to = directory.join(DATABASE_BACKUP);
        fs::copy(&from, &to).map_err(|e| MonitorError::io(&to, e))?;
        tracing::debug!(directory = %directory.display(), "no changes, backup refreshed");
    } else {
        tracing::info!(directory = %directory.display(), count = changes.len(), "changes found");
    }

    Ok(Outcome::Checked { changes })
}

/// Whether `directory` holds a database backup.
pub fn has_backup(directory: &Path) -> bool {
    directory.join(DATABASE_BACKUP).is_file()
}

/// Moves the backup over the database. Returns `false` when there is no backup.
pub fn restore_backup(directory: &Path) -> Result<bool, MonitorError> {
    let backup = directory.join(DATABASE_BACKUP);
    match fs::rename(&backup, directory.join(DATABASE_NAME)) {
        Ok(()) => {
            tracing::info!(directory = %directory.display(), "database restored from backup");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MonitorError::io(&backup, e)),
    }
}
