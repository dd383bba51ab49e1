//! Delivery history: which entry ids each feed has already delivered.
//!
//! On disk this is one plain-text file per [`StorageKey`] under the state
//! directory, one id per line, appended to and never rewritten.  The file
//! names match the ones earlier versions of the relay wrote, so existing
//! history keeps suppressing old entries.

use std::collections::HashSet;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::error::StorageError;

/// Longest key, in bytes, that still leaves room for the `.txt` suffix
/// under common file name limits.
pub const MAX_KEY_LEN: usize = 200;

/// Filesystem-safe name derived from a feed's display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// `@` is dropped, spaces become `_`, and anything that could act as a
    /// path separator or control character becomes `_` as well.
    pub fn from_source_name(source_name: &str) -> Self {
        let key: String = source_name
            .chars()
            .filter(|&c| c != '@')
            .map(|c| match c {
                ' ' | '/' | '\\' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();

        match key.as_str() {
            "" | "." | ".." => Self("_".repeat(key.len().max(1))),
            _ => Self(key),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistent, append-only set of delivered ids per key.
pub trait HistoryStore {
    /// All ids recorded for `key`.  A key with no history yields an empty
    /// set, not an error.
    fn load(&self, key: &StorageKey) -> Result<HashSet<String>, StorageError>;

    /// Durably append `id` to the history of `key`.  Recording the same id
    /// twice is harmless.
    fn record(&self, key: &StorageKey, id: &str) -> Result<(), StorageError>;
}

/// [`HistoryStore`] backed by `<dir>/<key>.txt` files.
pub struct FileHistoryStore {
    dir: PathBuf,
}

impl FileHistoryStore {
    /// The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.dir.join(format!("{}.txt", key.as_str()))
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self, key: &StorageKey) -> Result<HashSet<String>, StorageError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        // A torn write can leave a partial multibyte sequence behind; the
        // intact lines must still count.
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn record(&self, key: &StorageKey, id: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let write_err = |source| StorageError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(write_err)?;
        if !ends_with_newline(&mut file).map_err(write_err)? {
            file.write_all(b"\n").map_err(write_err)?;
        }
        writeln!(file, "{id}").map_err(write_err)?;
        file.sync_data().map_err(write_err)?;
        Ok(())
    }
}

/// True for an empty file too, so nothing is prepended to a fresh history.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
