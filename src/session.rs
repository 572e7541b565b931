// Token persistence between invocations.
//
// The session is a single bearer token stored as the sole line of a file.
// Each successful login overwrites it; `run` reads it back before sending.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Token file name inside the system temporary directory.
const TOKEN_FILE: &str = "logbook-cli-token";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("no session found at {}: {source}", path.display())]
    Missing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("session file {} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("failed to write session file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    /// Whether the caller has to log in again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(self, SessionError::Missing { .. } | SessionError::Empty { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join(TOKEN_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create or truncate the token file and write `token` followed by a newline.
    pub fn save(&self, token: &str) -> Result<(), SessionError> {
        let write_err = |source| SessionError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = open_for_write(&self.path).map_err(write_err)?;
        file.write_all(format!("{}\n", token).as_bytes())
            .map_err(write_err)?;
        debug!(path = %self.path.display(), "session token saved");
        Ok(())
    }

    /// Read the first line of the token file with surrounding whitespace removed.
    pub fn load(&self) -> Result<String, SessionError> {
        let missing = |source| SessionError::Missing {
            path: self.path.clone(),
            source,
        };

        let file = File::open(&self.path).map_err(missing)?;
        let mut line = String::new();
        BufReader::new(file).read_line(&mut line).map_err(missing)?;

        let token = line.trim();
        if token.is_empty() {
            return Err(SessionError::Empty {
                path: self.path.clone(),
            });
        }
        debug!(path = %self.path.display(), "session token loaded");
        Ok(token.to_string())
    }
}

#[cfg(unix)]
fn open_for_write(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
