use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed json in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Creates the state directory if needed and checks that it is writable.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => {
            return Err(PersistError::StateDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        }
        Err(err) => return Err(PersistError::StateDir(err.to_string())),
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    Ok(())
}

/// Whole-file JSON documents under one directory, replaced atomically.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `content` to a temp file beside the target, then renames it over.
    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_state_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }

    pub fn write_json<T: Serialize>(&self, filename: &str, value: &T) -> Result<PathBuf, PersistError> {
        let content = serde_json::to_string_pretty(value).map_err(|source| PersistError::Json {
            file: filename.to_string(),
            source,
        })?;
        self.write(filename, &content)
    }

    /// `Ok(None)` when the file has never been written.
    pub fn read_json<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>, PersistError> {
        let path = self.dir.join(filename);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PersistError::Io(err)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistError::Json {
                file: filename.to_string(),
                source,
            })
    }
}
