use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::dao::{
    kv_store::{KvStore, entry_cost},
    storage::{BackendError, BackendResult},
};

use super::{
    config::FileConfig,
    error::{FileDaoError, FileResult},
};

const VALUE_EXTENSION: &str = "val";
const TEMP_EXTENSION: &str = "val.tmp";

/// Directory-backed [`KvStore`] persisting one file per key.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: Arc<Path>,
    quota: Option<usize>,
}

impl FileKvStore {
    /// Open (and create when missing) the storage directory.
    pub fn open(config: FileConfig) -> FileResult<Self> {
        fs::create_dir_all(&config.dir).map_err(|source| FileDaoError::CreateDir {
            path: config.dir.clone(),
            source,
        })?;

        let store = Self {
            dir: Arc::from(config.dir.as_path()),
            quota: config.quota_bytes,
        };
        store.ensure_directory()?;
        Ok(store)
    }

    /// Directory holding the stored values.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_directory(&self) -> FileResult<()> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(FileDaoError::NotADirectory {
                path: self.dir.to_path_buf(),
            }),
            Err(source) => Err(FileDaoError::Read {
                path: self.dir.to_path_buf(),
                source,
            }),
        }
    }

    fn value_path(&self, key: &str) -> FileResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{VALUE_EXTENSION}")))
    }

    /// Bytes used by every stored pair except `key`.
    fn usage_without(&self, key: &str) -> FileResult<usize> {
        let list_err = |source| FileDaoError::ListDir {
            path: self.dir.to_path_buf(),
            source,
        };

        let mut used = 0;
        for dir_entry in fs::read_dir(&self.dir).map_err(list_err)? {
            let dir_entry = dir_entry.map_err(list_err)?;
            let file_name = dir_entry.file_name();
            let Some(stored_key) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(&format!(".{VALUE_EXTENSION}")))
            else {
                continue;
            };
            if stored_key == key {
                continue;
            }
            let size = dir_entry.metadata().map_err(list_err)?.len() as usize;
            used += stored_key.len() + size;
        }
        Ok(used)
    }

    fn write_value(&self, key: &str, value: &str) -> BackendResult<()> {
        let path = self.value_path(key)?;

        if let Some(limit) = self.quota {
            let needed = self.usage_without(key)? + entry_cost(key, value);
            if needed > limit {
                return Err(BackendError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    limit,
                });
            }
        }

        let temp = path.with_extension(TEMP_EXTENSION);
        fs::write(&temp, value).map_err(|source| FileDaoError::Write {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &path).map_err(|source| {
            let _ = fs::remove_file(&temp);
            FileDaoError::Write {
                path: path.clone(),
                source,
            }
        })?;

        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(FileDaoError::Read { path, source }.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        self.write_value(key, value)
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileDaoError::Remove { path, source }.into()),
        }
    }

    fn health_check(&self) -> BackendResult<()> {
        self.ensure_directory().map_err(Into::into)
    }
}

fn validate_key(key: &str) -> FileResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(FileDaoError::InvalidKey {
            key: key.to_owned(),
        })
    }
}
